//! Port abstraction for credential hashing.

use crate::domain::user::PlainPassword;

/// Failure while deriving a password hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("password hashing failed: {message}")]
pub struct PasswordHashError {
    /// Adapter-supplied diagnostic.
    pub message: String,
}

impl PasswordHashError {
    /// Wrap an adapter diagnostic.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Credential hashing used at registration, login, and password change.
///
/// Hashing is CPU-bound and synchronous; the cost per call is small enough
/// to run inline in a request handler.
pub trait PasswordHasher: Send + Sync {
    /// Derive a salted hash for storage.
    fn hash(&self, password: &PlainPassword) -> Result<String, PasswordHashError>;

    /// Check a login candidate against a stored hash. Malformed stored
    /// hashes verify as false rather than erroring.
    fn verify(&self, stored_hash: &str, candidate: &str) -> bool;
}
