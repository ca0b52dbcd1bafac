use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::auth::session::ACCESS_COOKIE;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

/// The caller behind a valid access token, loaded fresh from the store.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.or_else(|| {
            CookieJar::from_headers(&parts.headers)
                .get(ACCESS_COOKIE)
                .map(|c| c.value().to_string())
                .filter(|t| !t.is_empty())
        });

        let Some(token) = token else {
            return Err(AppError::Unauthorized("Unauthorized request".to_string()));
        };

        let claims = state.keys.verify_access(&token).map_err(|e| {
            tracing::debug!("Access token rejected: {e}");
            AppError::Unauthorized("Invalid access token".to_string())
        })?;

        let user = state
            .store
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid access token".to_string()))?;

        Ok(AuthUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(auth_header) = parts.headers.get("authorization") else {
        return Ok(None);
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid access token".to_string()))?;

    Ok(auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string))
}
