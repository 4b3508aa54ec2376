//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{posts, users, votes};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Row struct for reading from the posts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new post records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub body: &'a str,
    pub author_id: Uuid,
}

/// Changeset struct for partially updating a post.
///
/// `None` fields are skipped, so an owner can change the title, the body, or
/// both in one statement.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = posts)]
pub(crate) struct PostChanges<'a> {
    pub title: Option<&'a str>,
    pub body: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the votes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = votes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VoteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub direction: String,
}

/// Insertable struct for creating new vote records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = votes)]
pub(crate) struct NewVoteRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub direction: &'a str,
}
