//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations here only translate between Diesel row structs
//! and domain types; no business logic lives in this layer. Row structs
//! (`models.rs`) and table definitions (`schema.rs`) are internal and never
//! exposed to the domain. Connections come from a `bb8` pool with native
//! async support through `diesel-async`.

pub mod diesel_post_repository;
pub mod diesel_user_repository;
pub mod diesel_vote_repository;
pub(crate) mod models;
pub mod pool;
pub mod schema;

pub use diesel_post_repository::DieselPostRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use diesel_vote_repository::DieselVoteRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
