//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Duplicate usernames and emails are detected from the unique-constraint
//! names raised by PostgreSQL, so registration races resolve in the database
//! rather than with a check-then-insert window.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{NewUserRecord, UserPersistenceError, UserRecord, UserRepository};
use crate::domain::user::{EmailAddress, User, UserId, Username};

use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

const USERNAME_UNIQUE: &str = "users_username_key";
const EMAIL_UNIQUE: &str = "users_email_key";

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            return match info.constraint_name() {
                Some(USERNAME_UNIQUE) => UserPersistenceError::DuplicateUsername,
                Some(EMAIL_UNIQUE) => UserPersistenceError::DuplicateEmail,
                other => {
                    debug!(constraint = ?other, "unexpected unique violation");
                    UserPersistenceError::query("unique constraint violation")
                }
            };
        }
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => UserPersistenceError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserPersistenceError::connection("database connection error")
        }
        _ => UserPersistenceError::query("database error"),
    }
}

/// Convert a database row to a domain user.
///
/// Stored values passed domain validation at registration; a row that no
/// longer does indicates out-of-band writes and maps to a query error.
fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let username = Username::new(row.username).map_err(|violation| {
        UserPersistenceError::query(format!("stored username invalid: {}", violation.message))
    })?;
    let email = EmailAddress::new(row.email).map_err(|violation| {
        UserPersistenceError::query(format!("stored email invalid: {}", violation.message))
    })?;
    Ok(User {
        id: UserId::from_uuid(row.id),
        username,
        email,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_record(row: UserRow) -> Result<UserRecord, UserPersistenceError> {
    let password_hash = row.password_hash.clone();
    Ok(UserRecord {
        user: row_to_user(row)?,
        password_hash,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, new_user: NewUserRecord) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewUserRow {
            id: Uuid::new_v4(),
            username: new_user.username.as_ref(),
            email: new_user.email.as_ref(),
            password_hash: &new_user.password_hash,
        };
        let inserted: UserRow = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_user(inserted)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let uuids: Vec<Uuid> = ids.iter().map(UserId::as_uuid).collect();
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(uuids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_user).collect()
    }

    async fn find_record_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_record).transpose()
    }

    async fn find_record_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_record).transpose()
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((
                users::password_hash.eq(password_hash),
                users::updated_at.eq(chrono::Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(UserPersistenceError::query("user not found for update"));
        }
        Ok(())
    }
}
