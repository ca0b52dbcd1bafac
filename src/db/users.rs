use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{OneTimeTokenKind, User};

pub async fn create(pool: &PgPool, user: &User) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, username, email, avatar_url, password_hash, is_email_verified)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.avatar_url)
    .bind(&user.password_hash)
    .bind(user.is_email_verified)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username_or_email(
    pool: &PgPool,
    username: &str,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 OR email = $2 LIMIT 1")
        .bind(username)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn set_refresh_token_hash(
    pool: &PgPool,
    id: Uuid,
    token_hash: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET refresh_token_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_one_time_token(
    pool: &PgPool,
    id: Uuid,
    kind: OneTimeTokenKind,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let sql = match kind {
        OneTimeTokenKind::EmailVerification => {
            "UPDATE users SET email_verification_token = $2, email_verification_expiry = $3,
             updated_at = now() WHERE id = $1"
        }
        OneTimeTokenKind::PasswordReset => {
            "UPDATE users SET forgot_password_token = $2, forgot_password_expiry = $3,
             updated_at = now() WHERE id = $1"
        }
    };
    sqlx::query(sql)
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_by_one_time_token(
    pool: &PgPool,
    kind: OneTimeTokenKind,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<User>, sqlx::Error> {
    let sql = match kind {
        OneTimeTokenKind::EmailVerification => {
            "SELECT * FROM users
             WHERE email_verification_token = $1 AND email_verification_expiry > $2"
        }
        OneTimeTokenKind::PasswordReset => {
            "SELECT * FROM users
             WHERE forgot_password_token = $1 AND forgot_password_expiry > $2"
        }
    };
    sqlx::query_as::<_, User>(sql)
        .bind(token_hash)
        .bind(now)
        .fetch_optional(pool)
        .await
}

pub async fn mark_email_verified(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET is_email_verified = true, email_verification_token = NULL,
         email_verification_expiry = NULL, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn reset_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET password_hash = $2, forgot_password_token = NULL,
         forgot_password_expiry = NULL, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(())
}
