//! In-memory implementation of the `ResetTokenStore` port.
//!
//! Tokens live in process memory, so a restart invalidates outstanding
//! resets. That matches the reset flow's security posture: a token is a
//! short-lived, single-use credential, not durable state.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{ResetTokenError, ResetTokenStore};
use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy)]
struct PendingReset {
    user: UserId,
    expires_at: Instant,
}

/// Mutex-guarded token table. Expired entries are dropped lazily on access.
#[derive(Default)]
pub struct InMemoryResetTokenStore {
    tokens: Mutex<HashMap<String, PendingReset>>,
}

fn lock_poisoned<T>(_: T) -> ResetTokenError {
    ResetTokenError::new("reset token store lock poisoned")
}

#[async_trait]
impl ResetTokenStore for InMemoryResetTokenStore {
    async fn issue(&self, user: UserId, ttl: Duration) -> Result<String, ResetTokenError> {
        let token = Uuid::new_v4().to_string();
        let pending = PendingReset {
            user,
            expires_at: Instant::now() + ttl,
        };
        self.tokens
            .lock()
            .map_err(lock_poisoned)?
            .insert(token.clone(), pending);
        Ok(token)
    }

    async fn consume(&self, token: &str) -> Result<Option<UserId>, ResetTokenError> {
        let mut tokens = self.tokens.lock().map_err(lock_poisoned)?;
        tokens.retain(|_, pending| pending.expires_at > Instant::now());
        Ok(tokens.remove(token).map(|pending| pending.user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_token_consumes_exactly_once() {
        let store = InMemoryResetTokenStore::default();
        let user = UserId::random();

        let token = store
            .issue(user, Duration::from_secs(60))
            .await
            .expect("issue token");

        assert_eq!(store.consume(&token).await.expect("consume"), Some(user));
        assert_eq!(store.consume(&token).await.expect("consume again"), None);
    }

    #[tokio::test]
    async fn unknown_token_is_none() {
        let store = InMemoryResetTokenStore::default();
        assert_eq!(store.consume("bogus").await.expect("consume"), None);
    }

    #[tokio::test]
    async fn expired_token_is_not_honoured() {
        let store = InMemoryResetTokenStore::default();
        let user = UserId::random();

        let token = store
            .issue(user, Duration::ZERO)
            .await
            .expect("issue token");

        assert_eq!(store.consume(&token).await.expect("consume"), None);
    }
}
