pub mod memory;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, OneTimeTokenKind, User};

pub use memory::MemoryUserStore;

/// Credential store behind the auth routes.
///
/// Read-then-write sequences (refresh rotation, one-time token consumption)
/// are not transactional; concurrent writers race and the last one wins.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `AppError::Conflict` when the username
    /// or email is already taken.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, AppError>;

    /// Overwrite the single refresh token slot. `None` clears it.
    async fn set_refresh_token_hash(
        &self,
        id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), AppError>;

    async fn set_one_time_token(
        &self,
        id: Uuid,
        kind: OneTimeTokenKind,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Find the user holding `token_hash` in the given slot with an expiry
    /// strictly after `now`.
    async fn find_by_one_time_token(
        &self,
        kind: OneTimeTokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError>;

    /// Set the verified flag and clear the verification token.
    async fn mark_email_verified(&self, id: Uuid) -> Result<(), AppError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;

    /// Replace the password hash and clear the reset token.
    async fn reset_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let user = user.into_user(Utc::now());
        Ok(users::create(&self.pool, &user).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(users::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(users::find_by_email(&self.pool, email).await?)
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(users::find_by_username_or_email(&self.pool, username, email).await?)
    }

    async fn set_refresh_token_hash(
        &self,
        id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), AppError> {
        Ok(users::set_refresh_token_hash(&self.pool, id, token_hash).await?)
    }

    async fn set_one_time_token(
        &self,
        id: Uuid,
        kind: OneTimeTokenKind,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        Ok(users::set_one_time_token(&self.pool, id, kind, token_hash, expires_at).await?)
    }

    async fn find_by_one_time_token(
        &self,
        kind: OneTimeTokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        Ok(users::find_by_one_time_token(&self.pool, kind, token_hash, now).await?)
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), AppError> {
        Ok(users::mark_email_verified(&self.pool, id).await?)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        Ok(users::update_password(&self.pool, id, password_hash).await?)
    }

    async fn reset_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        Ok(users::reset_password(&self.pool, id, password_hash).await?)
    }
}
