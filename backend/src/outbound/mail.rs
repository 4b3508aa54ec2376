//! Mail adapters.
//!
//! Production delivery goes through an external provider; the bundled
//! adapter writes the reset link to the log instead, which is enough for
//! local development and staging.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{MailError, MailSender};
use crate::domain::user::EmailAddress;

/// Mail sender that logs the reset link instead of delivering it.
#[derive(Clone, Default)]
pub struct LogMailSender {
    /// Base URL the reset token is appended to, e.g. the frontend origin.
    reset_base_url: String,
}

impl LogMailSender {
    /// Create a sender that renders links under `reset_base_url`.
    pub fn new(reset_base_url: impl Into<String>) -> Self {
        Self {
            reset_base_url: reset_base_url.into(),
        }
    }
}

#[async_trait]
impl MailSender for LogMailSender {
    async fn send_password_reset(
        &self,
        recipient: &EmailAddress,
        reset_token: &str,
    ) -> Result<(), MailError> {
        info!(
            recipient = %recipient,
            link = format!("{}/change-password/{reset_token}", self.reset_base_url),
            "password reset link issued"
        );
        Ok(())
    }
}
