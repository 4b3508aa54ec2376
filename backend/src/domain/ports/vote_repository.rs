//! Port abstraction for vote persistence adapters and their errors.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::post::PostId;
use crate::domain::user::UserId;
use crate::domain::vote::{Vote, VoteDirection, VoteId};

/// Persistence errors raised by vote repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VotePersistenceError {
    /// Repository connection could not be established.
    #[error("vote repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied diagnostic.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("vote repository query failed: {message}")]
    Query {
        /// Adapter-supplied diagnostic.
        message: String,
    },
}

impl VotePersistenceError {
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

/// Vote persistence operations required by the vote and post services.
///
/// The one-vote-per-(user, post) invariant is the database's unique
/// constraint; [`VoteRepository::upsert`] is a single guarded
/// insert-or-update keyed on it, so concurrent votes from the same user
/// resolve last-writer-wins.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Insert a vote, or overwrite the direction of the caller's existing
    /// vote on the same post. Returns the stored vote either way.
    async fn upsert(
        &self,
        user: UserId,
        post: PostId,
        direction: VoteDirection,
    ) -> Result<Vote, VotePersistenceError>;

    /// Remove the caller's vote on a post, returning the removed vote's id,
    /// or `None` when no vote existed.
    async fn delete(
        &self,
        user: UserId,
        post: PostId,
    ) -> Result<Option<VoteId>, VotePersistenceError>;

    /// All vote directions grouped by post, for batch point tallies over a
    /// feed page. Posts without votes are simply absent from the map.
    async fn directions_for_posts(
        &self,
        post_ids: &[PostId],
    ) -> Result<HashMap<PostId, Vec<VoteDirection>>, VotePersistenceError>;

    /// The given user's own vote per post, for annotating a feed page.
    async fn user_votes_for_posts(
        &self,
        user: UserId,
        post_ids: &[PostId],
    ) -> Result<HashMap<PostId, VoteDirection>, VotePersistenceError>;
}
