//! Vote domain service: cast, re-cast, and retract votes on posts.

use std::sync::Arc;

use tracing::info;

use crate::domain::error::Error;
use crate::domain::ports::{
    PostPersistenceError, PostRepository, VotePersistenceError, VoteRepository,
};
use crate::domain::post::PostId;
use crate::domain::user::UserId;
use crate::domain::vote::{VoteDirection, VoteReceipt, tally};

fn map_post_error(error: PostPersistenceError) -> Error {
    match error {
        PostPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("post repository unavailable: {message}"))
        }
        PostPersistenceError::Query { message } => {
            Error::internal(format!("post repository error: {message}"))
        }
    }
}

fn map_vote_error(error: VotePersistenceError) -> Error {
    match error {
        VotePersistenceError::Connection { message } => {
            Error::service_unavailable(format!("vote repository unavailable: {message}"))
        }
        VotePersistenceError::Query { message } => {
            Error::internal(format!("vote repository error: {message}"))
        }
    }
}

/// Vote operations. A user holds at most one vote per post; casting again
/// flips the stored direction rather than adding a row.
#[derive(Clone)]
pub struct VoteService {
    posts: Arc<dyn PostRepository>,
    votes: Arc<dyn VoteRepository>,
}

impl VoteService {
    /// Assemble the service from its driven ports.
    pub fn new(posts: Arc<dyn PostRepository>, votes: Arc<dyn VoteRepository>) -> Self {
        Self { posts, votes }
    }

    /// Cast (or re-cast) `user`'s vote on a post, returning the stored vote
    /// id together with the post's recomputed points.
    pub async fn cast(
        &self,
        user: UserId,
        post: PostId,
        direction: VoteDirection,
    ) -> Result<VoteReceipt, Error> {
        self.require_post(post).await?;

        let vote = self
            .votes
            .upsert(user, post, direction)
            .await
            .map_err(map_vote_error)?;
        let points = self.points_for(post).await?;
        info!(post_id = %post, user_id = %user, direction = ?direction, "vote cast");

        Ok(VoteReceipt {
            vote_id: vote.id,
            points,
        })
    }

    /// Retract `user`'s vote on a post. Returns `None` when no vote existed;
    /// otherwise the removed vote's id with the post's recomputed points.
    pub async fn retract(
        &self,
        user: UserId,
        post: PostId,
    ) -> Result<Option<VoteReceipt>, Error> {
        self.require_post(post).await?;

        let Some(vote_id) = self
            .votes
            .delete(user, post)
            .await
            .map_err(map_vote_error)?
        else {
            return Ok(None);
        };
        let points = self.points_for(post).await?;
        info!(post_id = %post, user_id = %user, "vote retracted");

        Ok(Some(VoteReceipt { vote_id, points }))
    }

    async fn require_post(&self, post: PostId) -> Result<(), Error> {
        self.posts
            .find_by_id(post)
            .await
            .map_err(map_post_error)?
            .map(|_| ())
            .ok_or_else(|| Error::not_found("invalid postId"))
    }

    async fn points_for(&self, post: PostId) -> Result<i64, Error> {
        let mut directions = self
            .votes
            .directions_for_posts(&[post])
            .await
            .map_err(map_vote_error)?;
        Ok(tally(directions.remove(&post).unwrap_or_default()))
    }
}
