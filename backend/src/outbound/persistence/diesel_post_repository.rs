//! PostgreSQL-backed `PostRepository` implementation using Diesel ORM.
//!
//! Ownership checks on update and delete live in the same SQL statement as
//! the write, so a non-owner request cannot race past the guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{PostPersistenceError, PostRepository};
use crate::domain::post::{NewPost, Post, PostId, PostPatch};
use crate::domain::user::UserId;

use super::models::{NewPostRow, PostChanges, PostRow};
use super::pool::{DbPool, PoolError};
use super::schema::posts;

/// Diesel-backed implementation of the `PostRepository` port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PostPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            PostPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> PostPersistenceError {
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
        DieselError::NotFound => PostPersistenceError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            PostPersistenceError::connection("database connection error")
        }
        _ => PostPersistenceError::query("database error"),
    }
}

fn row_to_post(row: PostRow) -> Post {
    Post {
        id: PostId::from_uuid(row.id),
        title: row.title,
        body: row.body,
        author_id: UserId::from_uuid(row.author_id),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn insert(
        &self,
        author: UserId,
        new_post: NewPost,
    ) -> Result<Post, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewPostRow {
            id: Uuid::new_v4(),
            title: &new_post.title,
            body: &new_post.body,
            author_id: author.as_uuid(),
        };
        let inserted: PostRow = diesel::insert_into(posts::table)
            .values(&row)
            .returning(PostRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(row_to_post(inserted))
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PostRow> = posts::table
            .filter(posts::id.eq(id.as_uuid()))
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_post))
    }

    async fn update_owned(
        &self,
        id: PostId,
        owner: UserId,
        patch: PostPatch,
    ) -> Result<Option<Post>, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = PostChanges {
            title: patch.title.as_deref(),
            body: patch.body.as_deref(),
            updated_at: Utc::now(),
        };
        let row: Option<PostRow> = diesel::update(
            posts::table
                .filter(posts::id.eq(id.as_uuid()))
                .filter(posts::author_id.eq(owner.as_uuid())),
        )
        .set(&changes)
        .returning(PostRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        Ok(row.map(row_to_post))
    }

    async fn delete_owned(&self, id: PostId, owner: UserId) -> Result<bool, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            posts::table
                .filter(posts::id.eq(id.as_uuid()))
                .filter(posts::author_id.eq(owner.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn feed_page(
        &self,
        older_than: Option<DateTime<Utc>>,
        fetch: i64,
    ) -> Result<Vec<Post>, PostPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = posts::table.into_boxed();
        if let Some(bound) = older_than {
            query = query.filter(posts::created_at.lt(bound));
        }
        let rows: Vec<PostRow> = query
            .order(posts::created_at.desc())
            .limit(fetch)
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_post).collect())
    }
}
