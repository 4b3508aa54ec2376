//! Port abstraction for outbound transactional email.

use async_trait::async_trait;

use crate::domain::user::EmailAddress;

/// Failure while handing mail to the outbound transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mail delivery failed: {message}")]
pub struct MailError {
    /// Adapter-supplied diagnostic.
    pub message: String,
}

impl MailError {
    /// Wrap an adapter diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outbound transactional mail. The production transport is an external
/// collaborator; the bundled adapter only logs the reset link.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Send a password-reset message carrying the single-use token.
    async fn send_password_reset(
        &self,
        recipient: &EmailAddress,
        reset_token: &str,
    ) -> Result<(), MailError>;
}
