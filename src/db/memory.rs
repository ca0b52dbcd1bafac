use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{NewUser, OneTimeTokenKind, User};

/// Process-local credential store used when no database is configured and
/// by the integration tests. Contents are lost on restart.
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
    /// email -> user id
    emails: DashMap<String, Uuid>,
    /// username -> user id
    usernames: DashMap<String, Uuid>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            usernames: DashMap::new(),
        }
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut User)) {
        if let Some(mut user) = self.users.get_mut(&id) {
            f(user.value_mut());
            user.updated_at = Utc::now();
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn conflict() -> AppError {
    AppError::Conflict("Username or email already exists".to_string())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let user = user.into_user(Utc::now());

        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(conflict()),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }

        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => {
                self.emails.remove(&user.email);
                return Err(conflict());
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }

        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.emails.get(email).map(|e| *e.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let id = self
            .usernames
            .get(username)
            .map(|e| *e.value())
            .or_else(|| self.emails.get(email).map(|e| *e.value()));
        match id {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn set_refresh_token_hash(
        &self,
        id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), AppError> {
        self.update(id, |user| {
            user.refresh_token_hash = token_hash.map(str::to_string);
        });
        Ok(())
    }

    async fn set_one_time_token(
        &self,
        id: Uuid,
        kind: OneTimeTokenKind,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.update(id, |user| {
            let (token, expiry) = kind.slot_mut(user);
            *token = Some(token_hash.to_string());
            *expiry = Some(expires_at);
        });
        Ok(())
    }

    async fn find_by_one_time_token(
        &self,
        kind: OneTimeTokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let found = self.users.iter().find_map(|entry| {
            let user = entry.value();
            match kind.slot(user) {
                (Some(stored), Some(expiry))
                    if expiry > now && bool::from(stored.as_bytes().ct_eq(token_hash.as_bytes())) =>
                {
                    Some(user.clone())
                }
                _ => None,
            }
        });
        Ok(found)
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<(), AppError> {
        self.update(id, |user| {
            user.is_email_verified = true;
            user.email_verification_token = None;
            user.email_verification_expiry = None;
        });
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        self.update(id, |user| {
            user.password_hash = password_hash.to_string();
        });
        Ok(())
    }

    async fn reset_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        self.update(id, |user| {
            user.password_hash = password_hash.to_string();
            user.forgot_password_token = None;
            user.forgot_password_expiry = None;
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_username_or_email() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "a@x.com")).await.unwrap();

        let err = store.create(new_user("alice", "b@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = store.create(new_user("bob", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // The failed username insert must not leave b@x.com reserved.
        store.create(new_user("bob", "b@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn one_time_token_lookup_honours_expiry() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("alice", "a@x.com")).await.unwrap();
        let now = Utc::now();

        store
            .set_one_time_token(
                user.id,
                OneTimeTokenKind::PasswordReset,
                "digest",
                now + Duration::minutes(20),
            )
            .await
            .unwrap();

        let hit = store
            .find_by_one_time_token(OneTimeTokenKind::PasswordReset, "digest", now)
            .await
            .unwrap();
        assert_eq!(hit.map(|u| u.id), Some(user.id));

        let wrong_slot = store
            .find_by_one_time_token(OneTimeTokenKind::EmailVerification, "digest", now)
            .await
            .unwrap();
        assert!(wrong_slot.is_none());

        let expired = store
            .find_by_one_time_token(
                OneTimeTokenKind::PasswordReset,
                "digest",
                now + Duration::minutes(21),
            )
            .await
            .unwrap();
        assert!(expired.is_none());
    }
}
