//! Driven ports: the persistence and collaborator seams the domain
//! services depend on. Outbound adapters implement these traits.

pub mod mail_sender;
pub mod password_hasher;
pub mod post_repository;
pub mod reset_token_store;
pub mod user_repository;
pub mod vote_repository;

pub use mail_sender::{MailError, MailSender};
pub use password_hasher::{PasswordHashError, PasswordHasher};
pub use post_repository::{PostPersistenceError, PostRepository};
pub use reset_token_store::{ResetTokenError, ResetTokenStore};
pub use user_repository::{NewUserRecord, UserPersistenceError, UserRecord, UserRepository};
pub use vote_repository::{VotePersistenceError, VoteRepository};
