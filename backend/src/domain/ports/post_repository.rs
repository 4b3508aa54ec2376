//! Port abstraction for post persistence adapters and their errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::post::{NewPost, Post, PostId, PostPatch};
use crate::domain::user::UserId;

/// Persistence errors raised by post repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostPersistenceError {
    /// Repository connection could not be established.
    #[error("post repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied diagnostic.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("post repository query failed: {message}")]
    Query {
        /// Adapter-supplied diagnostic.
        message: String,
    },
}

impl PostPersistenceError {
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

/// Post persistence operations required by the post and vote services.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post owned by `author`.
    async fn insert(&self, author: UserId, new_post: NewPost)
    -> Result<Post, PostPersistenceError>;

    /// Fetch a post by identifier.
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostPersistenceError>;

    /// Apply a patch to a post only when `owner` authored it. The ownership
    /// check lives in the same statement as the write, so a non-owner call
    /// changes nothing and returns `None`.
    async fn update_owned(
        &self,
        id: PostId,
        owner: UserId,
        patch: PostPatch,
    ) -> Result<Option<Post>, PostPersistenceError>;

    /// Delete a post only when `owner` authored it; votes cascade. Returns
    /// whether a row was deleted.
    async fn delete_owned(&self, id: PostId, owner: UserId) -> Result<bool, PostPersistenceError>;

    /// One keyset page: posts strictly older than `older_than` (all posts
    /// when `None`), newest first, at most `fetch` rows. Callers pass one
    /// more than the page size to learn whether further rows exist.
    async fn feed_page(
        &self,
        older_than: Option<DateTime<Utc>>,
        fetch: i64,
    ) -> Result<Vec<Post>, PostPersistenceError>;
}
