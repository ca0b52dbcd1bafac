pub mod auth;
pub mod healthcheck;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/v1/healthcheck", get(healthcheck::healthcheck))
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/verify-email/{token}", get(auth::verify_email))
        .route(
            "/api/v1/auth/refresh-token",
            get(auth::refresh_token).post(auth::refresh_token),
        )
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password/{token}", post(auth::reset_password))
        // Auth required
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/current-user", get(auth::current_user))
        .route(
            "/api/v1/auth/resend-verification-email",
            post(auth::resend_verification_email),
        )
        .route("/api/v1/auth/change-password", post(auth::change_password))
}
