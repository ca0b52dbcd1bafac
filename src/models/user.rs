use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_AVATAR_URL: &str = "https://placehold.co/100x100";

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_email_verified: bool,
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub email_verification_expiry: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub forgot_password_token: Option<String>,
    #[serde(skip_serializing)]
    pub forgot_password_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied at registration. `username` and `email` are already
/// normalized and `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::now_v7(),
            username: self.username,
            email: self.email,
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            password_hash: self.password_hash,
            is_email_verified: false,
            refresh_token_hash: None,
            email_verification_token: None,
            email_verification_expiry: None,
            forgot_password_token: None,
            forgot_password_expiry: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Which one-time token slot on the user record an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneTimeTokenKind {
    EmailVerification,
    PasswordReset,
}

impl OneTimeTokenKind {
    pub fn slot<'a>(&self, user: &'a User) -> (Option<&'a str>, Option<DateTime<Utc>>) {
        match self {
            OneTimeTokenKind::EmailVerification => (
                user.email_verification_token.as_deref(),
                user.email_verification_expiry,
            ),
            OneTimeTokenKind::PasswordReset => (
                user.forgot_password_token.as_deref(),
                user.forgot_password_expiry,
            ),
        }
    }

    pub fn slot_mut<'a>(
        &self,
        user: &'a mut User,
    ) -> (&'a mut Option<String>, &'a mut Option<DateTime<Utc>>) {
        match self {
            OneTimeTokenKind::EmailVerification => (
                &mut user.email_verification_token,
                &mut user.email_verification_expiry,
            ),
            OneTimeTokenKind::PasswordReset => (
                &mut user.forgot_password_token,
                &mut user.forgot_password_expiry,
            ),
        }
    }
}
