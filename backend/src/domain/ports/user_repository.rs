//! Port abstraction for user persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::user::{EmailAddress, User, UserId, Username};

/// Persistence errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied diagnostic.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query {
        /// Adapter-supplied diagnostic.
        message: String,
    },
    /// The username is already registered.
    #[error("username already taken")]
    DuplicateUsername,
    /// The email is already registered.
    #[error("email already taken")]
    DuplicateEmail,
}

impl UserPersistenceError {
    /// Connection-level failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Query-level failure.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// A stored user together with the credential hash needed to verify logins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// The user as exposed to the rest of the domain.
    pub user: User,
    /// Argon2 hash of the user's password.
    pub password_hash: String,
}

/// Validated registration data ready for insertion.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    /// Unique username.
    pub username: Username,
    /// Unique email address.
    pub email: EmailAddress,
    /// Argon2 hash of the chosen password.
    pub password_hash: String,
}

/// User persistence operations required by the account service.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; the unique constraints surface as the
    /// `Duplicate*` variants.
    async fn insert(&self, new_user: NewUserRecord) -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Batch-fetch users for author resolution on a feed page.
    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError>;

    /// Fetch a user and credential hash by username.
    async fn find_record_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError>;

    /// Fetch a user and credential hash by email.
    async fn find_record_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError>;

    /// Replace a user's credential hash after a password change.
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), UserPersistenceError>;
}
