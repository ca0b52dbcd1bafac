use std::sync::LazyLock;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::auth::session::{self, REFRESH_COOKIE};
use crate::auth::tokens::{self, OneTimeToken};
use crate::email;
use crate::error::AppError;
use crate::models::{NewUser, OneTimeTokenKind, User};
use crate::response::ApiResponse;
use crate::state::SharedState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
const INVALID_ONE_TIME_TOKEN: &str = "Invalid or expired token";

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Serialize)]
pub struct UserData {
    pub user: User,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshData {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedData {
    pub is_email_verified: bool,
}

/// Usernames and emails are matched case-insensitively and without
/// surrounding whitespace.
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn verification_url(state: &SharedState, token: &str) -> String {
    format!(
        "{}/api/v1/auth/verify-email/{token}",
        state.config.public_url
    )
}

async fn send_verification(state: &SharedState, user: &User) -> Result<(), AppError> {
    let token = OneTimeToken::generate();
    state
        .store
        .set_one_time_token(
            user.id,
            OneTimeTokenKind::EmailVerification,
            &token.hash,
            token.expires_at,
        )
        .await?;

    let url = verification_url(state, &token.plaintext);
    email::deliver(
        state,
        email::verification_email(&user.email, &user.username, &url),
    )
    .await;
    Ok(())
}

/// Hash the presented plaintext and find the user holding that digest in an
/// unexpired slot. Wrong and expired tokens are indistinguishable.
async fn consume_one_time_token(
    state: &SharedState,
    kind: OneTimeTokenKind,
    plaintext: &str,
) -> Result<User, AppError> {
    if plaintext.is_empty() {
        return Err(AppError::BadRequest(INVALID_ONE_TIME_TOKEN.to_string()));
    }

    state
        .store
        .find_by_one_time_token(kind, &tokens::hash_token(plaintext), Utc::now())
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_ONE_TIME_TOKEN.to_string()))
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<ApiResponse<UserData>, AppError> {
    let address = normalize(&req.email);
    let username = normalize(&req.username);

    if address.is_empty() || username.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email, username and password are required fields".to_string(),
        ));
    }

    if !EMAIL_RE.is_match(&address) {
        return Err(AppError::BadRequest("Email is invalid".to_string()));
    }

    if state
        .store
        .find_by_username_or_email(&username, &address)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Username or email already exists".to_string(),
        ));
    }

    let password_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = state
        .store
        .create(NewUser {
            username,
            email: address,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    send_verification(&state, &user).await?;

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        UserData { user },
        "User registered successfully. Please check your email to verify your account.",
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginData>), AppError> {
    let address = normalize(&req.email);

    if address.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required fields".to_string(),
        ));
    }

    if state.login_limiter.check(&address).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let Some(user) = state.store.find_by_email(&address).await? else {
        state.login_limiter.record_failure(&address);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        state.login_limiter.record_failure(&address);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    state.login_limiter.reset(&address);

    let pair = session::issue_token_pair(&state, &user).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    let jar = session::auth_cookies(&state, &pair);
    Ok((
        jar,
        ApiResponse::ok(
            LoginData {
                user,
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

pub async fn logout(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
) -> Result<(CookieJar, ApiResponse<Value>), AppError> {
    state.store.set_refresh_token_hash(user.id, None).await?;

    tracing::info!(user_id = %user.id, "User logged out");

    Ok((
        session::clear_auth_cookies(),
        ApiResponse::ok(json!({}), "User logged out successfully"),
    ))
}

pub async fn current_user(AuthUser(user): AuthUser) -> ApiResponse<UserData> {
    ApiResponse::ok(UserData { user }, "Current user fetched successfully")
}

pub async fn verify_email(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<ApiResponse<VerifiedData>, AppError> {
    let user =
        consume_one_time_token(&state, OneTimeTokenKind::EmailVerification, &token).await?;

    state.store.mark_email_verified(user.id).await?;

    tracing::info!(user_id = %user.id, "Email verified");

    Ok(ApiResponse::ok(
        VerifiedData {
            is_email_verified: true,
        },
        "Email verified successfully",
    ))
}

pub async fn resend_verification_email(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
) -> Result<ApiResponse<Value>, AppError> {
    if user.is_email_verified {
        return Err(AppError::Conflict("Email is already verified".to_string()));
    }

    send_verification(&state, &user).await?;

    Ok(ApiResponse::ok(
        json!({}),
        "Verification email resent successfully. Please check your email to verify your account.",
    ))
}

pub async fn refresh_token(
    State(state): State<SharedState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, ApiResponse<RefreshData>), AppError> {
    let incoming = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            serde_json::from_slice::<RefreshTokenRequest>(&body)
                .ok()
                .and_then(|req| req.refresh_token)
                .filter(|t| !t.is_empty())
        })
        .ok_or_else(|| AppError::Unauthorized("Unauthorized access".to_string()))?;

    let invalid = || AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string());

    let claims = state.keys.verify_refresh(&incoming).map_err(|e| {
        tracing::debug!("Refresh token rejected: {e}");
        invalid()
    })?;

    let user = state
        .store
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(invalid)?;

    let current = user.refresh_token_hash.as_deref().ok_or_else(invalid)?;
    if !tokens::matches_hash(&incoming, current) {
        tracing::warn!(user_id = %user.id, "Stale refresh token presented");
        return Err(invalid());
    }

    let pair = session::issue_token_pair(&state, &user).await?;

    let jar = session::auth_cookies(&state, &pair);
    Ok((
        jar,
        ApiResponse::ok(
            RefreshData {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "Access token refreshed successfully",
        ),
    ))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<ApiResponse<Value>, AppError> {
    let address = normalize(&req.email);
    if address.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    // Same response whether or not the address is registered.
    let response = ApiResponse::ok(
        json!({}),
        "If that email is registered, a password reset link has been sent.",
    );

    let Some(user) = state.store.find_by_email(&address).await? else {
        return Ok(response);
    };

    let token = OneTimeToken::generate();
    state
        .store
        .set_one_time_token(
            user.id,
            OneTimeTokenKind::PasswordReset,
            &token.hash,
            token.expires_at,
        )
        .await?;

    let reset_url = format!(
        "{}/{}",
        state.config.forgot_password_redirect_url, token.plaintext
    );
    email::deliver(
        &state,
        email::password_reset_email(&user.email, &user.username, &reset_url),
    )
    .await;

    tracing::info!(user_id = %user.id, "Password reset requested");

    Ok(response)
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<ApiResponse<Value>, AppError> {
    if req.new_password.is_empty() {
        return Err(AppError::BadRequest("New password is required".to_string()));
    }

    let user = consume_one_time_token(&state, OneTimeTokenKind::PasswordReset, &token).await?;

    let password_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    state.store.reset_password(user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password reset");

    Ok(ApiResponse::ok(
        json!({}),
        "Password has been reset successfully.",
    ))
}

pub async fn change_password(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<Value>, AppError> {
    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(AppError::BadRequest(
            "Old password and new password are required fields".to_string(),
        ));
    }

    let valid =
        password::verify(&req.old_password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Old password is incorrect".to_string(),
        ));
    }

    let password_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    state.store.update_password(user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(ApiResponse::ok(
        json!({}),
        "Password has been changed successfully.",
    ))
}
