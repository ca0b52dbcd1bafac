use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Lifetime of email verification and password reset tokens.
pub const ONE_TIME_TOKEN_TTL_MINUTES: i64 = 20;

/// A freshly generated one-time token. Only `hash` and `expires_at` are
/// stored; `plaintext` goes into the emailed link and nowhere else.
pub struct OneTimeToken {
    pub plaintext: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeToken {
    pub fn generate() -> Self {
        let bytes: [u8; 20] = rand::random();
        let plaintext = hex::encode(bytes);
        let hash = hash_token(&plaintext);
        Self {
            plaintext,
            hash,
            expires_at: Utc::now() + Duration::minutes(ONE_TIME_TOKEN_TTL_MINUTES),
        }
    }
}

/// SHA-256 hex digest used for every token persisted on a user record.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash `presented` and compare it against a stored digest in constant time.
pub fn matches_hash(presented: &str, stored_hash: &str) -> bool {
    hash_token(presented)
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}
