//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation. When migrations change the schema, regenerate with
//! `diesel print-schema` or update by hand.

diesel::table! {
    /// Registered accounts.
    ///
    /// `username` and `email` both carry unique constraints
    /// (`users_username_key`, `users_email_key`).
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique login and display handle.
        username -> Varchar,
        /// Unique contact address.
        email -> Varchar,
        /// Argon2 hash of the account password.
        password_hash -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Text posts, keyset-paginated on `created_at`.
    posts (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Post headline.
        title -> Varchar,
        /// Full post body.
        body -> Text,
        /// Owning user.
        author_id -> Uuid,
        /// Record creation timestamp, the feed's sort key.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Up/down votes, one per (user, post) pair.
    ///
    /// `(user_id, post_id)` carries the unique constraint
    /// `votes_user_id_post_id_key`; `post_id` cascades on post deletion.
    votes (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Voting user.
        user_id -> Uuid,
        /// Post being voted on.
        post_id -> Uuid,
        /// `up` or `down`.
        direction -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Timestamp of the last direction change.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(posts -> users (author_id));
diesel::joinable!(votes -> posts (post_id));
diesel::joinable!(votes -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, posts, votes);
