//! PostgreSQL-backed `VoteRepository` implementation using Diesel ORM.
//!
//! The one-vote-per-(user, post) invariant lives in the database's unique
//! constraint; casting a vote is a single `INSERT ... ON CONFLICT DO UPDATE`
//! so concurrent votes from the same user resolve last-writer-wins.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{VotePersistenceError, VoteRepository};
use crate::domain::post::PostId;
use crate::domain::user::UserId;
use crate::domain::vote::{Vote, VoteDirection, VoteId};

use super::models::{NewVoteRow, VoteRow};
use super::pool::{DbPool, PoolError};
use super::schema::votes;

/// Diesel-backed implementation of the `VoteRepository` port.
#[derive(Clone)]
pub struct DieselVoteRepository {
    pool: DbPool,
}

impl DieselVoteRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> VotePersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            VotePersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> VotePersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => VotePersistenceError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            VotePersistenceError::connection("database connection error")
        }
        _ => VotePersistenceError::query("database error"),
    }
}

const fn direction_to_db(direction: VoteDirection) -> &'static str {
    match direction {
        VoteDirection::Up => "up",
        VoteDirection::Down => "down",
    }
}

fn parse_direction(raw: &str, vote_id: Uuid) -> Option<VoteDirection> {
    match raw {
        "up" => Some(VoteDirection::Up),
        "down" => Some(VoteDirection::Down),
        other => {
            warn!(value = other, vote_id = %vote_id, "unrecognised vote direction");
            None
        }
    }
}

fn row_to_vote(row: VoteRow) -> Result<Vote, VotePersistenceError> {
    let direction = parse_direction(&row.direction, row.id)
        .ok_or_else(|| VotePersistenceError::query("unrecognised vote direction"))?;
    Ok(Vote {
        id: VoteId::from_uuid(row.id),
        post_id: PostId::from_uuid(row.post_id),
        user_id: UserId::from_uuid(row.user_id),
        direction,
    })
}

#[async_trait]
impl VoteRepository for DieselVoteRepository {
    async fn upsert(
        &self,
        user: UserId,
        post: PostId,
        direction: VoteDirection,
    ) -> Result<Vote, VotePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewVoteRow {
            id: Uuid::new_v4(),
            user_id: user.as_uuid(),
            post_id: post.as_uuid(),
            direction: direction_to_db(direction),
        };
        let stored: VoteRow = diesel::insert_into(votes::table)
            .values(&row)
            .on_conflict((votes::user_id, votes::post_id))
            .do_update()
            .set((
                votes::direction.eq(direction_to_db(direction)),
                votes::updated_at.eq(Utc::now()),
            ))
            .returning(VoteRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_vote(stored)
    }

    async fn delete(
        &self,
        user: UserId,
        post: PostId,
    ) -> Result<Option<VoteId>, VotePersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let removed: Option<Uuid> = diesel::delete(
            votes::table
                .filter(votes::user_id.eq(user.as_uuid()))
                .filter(votes::post_id.eq(post.as_uuid())),
        )
        .returning(votes::id)
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        Ok(removed.map(VoteId::from_uuid))
    }

    async fn directions_for_posts(
        &self,
        post_ids: &[PostId],
    ) -> Result<HashMap<PostId, Vec<VoteDirection>>, VotePersistenceError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let uuids: Vec<Uuid> = post_ids.iter().map(PostId::as_uuid).collect();
        let rows: Vec<VoteRow> = votes::table
            .filter(votes::post_id.eq_any(uuids))
            .select(VoteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut grouped: HashMap<PostId, Vec<VoteDirection>> = HashMap::new();
        for row in rows {
            // Unparseable rows are logged and skipped rather than failing
            // the whole page.
            if let Some(direction) = parse_direction(&row.direction, row.id) {
                grouped
                    .entry(PostId::from_uuid(row.post_id))
                    .or_default()
                    .push(direction);
            }
        }
        Ok(grouped)
    }

    async fn user_votes_for_posts(
        &self,
        user: UserId,
        post_ids: &[PostId],
    ) -> Result<HashMap<PostId, VoteDirection>, VotePersistenceError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let uuids: Vec<Uuid> = post_ids.iter().map(PostId::as_uuid).collect();
        let rows: Vec<VoteRow> = votes::table
            .filter(votes::user_id.eq(user.as_uuid()))
            .filter(votes::post_id.eq_any(uuids))
            .select(VoteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                parse_direction(&row.direction, row.id)
                    .map(|direction| (PostId::from_uuid(row.post_id), direction))
            })
            .collect())
    }
}
