use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::models::User;

/// Short-lived token carried on every authenticated request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Long-lived token whose only job is to mint a new pair. `jti` keeps two
/// tokens issued within the same second distinct.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material for both token kinds. Access and refresh tokens use
/// separate secrets, so neither verifies as the other.
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: lifetime(config.access_ttl),
            refresh_ttl: lifetime(config.refresh_ttl),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn sign_access(&self, user: &User) -> Result<String, String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: expiry(now, self.access_ttl)?,
        };
        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| format!("JWT encode failed: {e}"))
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> Result<String, String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id,
            jti: Uuid::now_v7(),
            iat: now.timestamp(),
            exp: expiry(now, self.refresh_ttl)?,
        };
        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| format!("JWT encode failed: {e}"))
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, String> {
        decode::<AccessClaims>(token, &self.access_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| format!("JWT decode failed: {e}"))
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, String> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| format!("JWT decode failed: {e}"))
    }
}

/// Out-of-range lifetimes saturate here and are refused when a token is signed.
fn lifetime(ttl: std::time::Duration) -> Duration {
    i64::try_from(ttl.as_secs())
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<i64, String> {
    now.checked_add_signed(ttl)
        .map(|exp| exp.timestamp())
        .ok_or_else(|| "token lifetime is out of range".to_string())
}
