//! Port abstraction for single-use password-reset tokens.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::user::UserId;

/// Failure inside the token store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("reset token store failed: {message}")]
pub struct ResetTokenError {
    /// Adapter-supplied diagnostic.
    pub message: String,
}

impl ResetTokenError {
    /// Wrap an adapter diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Issuance and consumption of single-use password-reset tokens.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    /// Issue a fresh token for `user`, valid for `ttl`.
    async fn issue(&self, user: UserId, ttl: Duration) -> Result<String, ResetTokenError>;

    /// Consume a token, returning its user when it is known and unexpired.
    /// A consumed token is gone; a second call returns `None`.
    async fn consume(&self, token: &str) -> Result<Option<UserId>, ResetTokenError>;
}
