use std::sync::Arc;

use crate::auth::jwt::TokenKeys;
use crate::config::Config;
use crate::db::UserStore;
use crate::email::Mailer;
use crate::rate_limit::LoginRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Config,
    pub keys: TokenKeys,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub login_limiter: LoginRateLimiter,
}
