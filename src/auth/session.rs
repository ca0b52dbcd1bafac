use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

use crate::auth::tokens::hash_token;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Sign a new access/refresh pair for `user` and overwrite the user's
/// refresh slot with the new token's digest. The slot is written before the
/// pair is handed back, so the persisted and returned values always agree.
pub async fn issue_token_pair(state: &AppState, user: &User) -> Result<TokenPair, AppError> {
    let access_token = state.keys.sign_access(user).map_err(AppError::Internal)?;
    let refresh_token = state
        .keys
        .sign_refresh(user.id)
        .map_err(AppError::Internal)?;

    state
        .store
        .set_refresh_token_hash(user.id, Some(&hash_token(&refresh_token)))
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

pub fn auth_cookies(state: &AppState, pair: &TokenPair) -> CookieJar {
    let access = Cookie::build((ACCESS_COOKIE, pair.access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.keys.access_ttl().num_seconds()))
        .build();

    let refresh = Cookie::build((REFRESH_COOKIE, pair.refresh_token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.keys.refresh_ttl().num_seconds()))
        .build();

    CookieJar::new().add(access).add(refresh)
}

pub fn clear_auth_cookies() -> CookieJar {
    let access = Cookie::build((ACCESS_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build((REFRESH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}
