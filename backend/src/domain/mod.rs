//! Domain layer: entities, validation, services, and the ports they
//! depend on. Nothing in here touches HTTP or the database directly.

pub mod account_service;
pub mod error;
pub mod ports;
pub mod post;
pub mod post_service;
pub mod user;
pub mod vote;
pub mod vote_service;

pub use account_service::{AccountService, Registration};
pub use error::{Error, ErrorCode, FieldViolation, TRACE_ID_HEADER, validation_error};
pub use post::{NewPost, Post, PostId, PostPatch, SNIPPET_LEN};
pub use post_service::{FeedEntry, FeedPage, PostService, PostView};
pub use user::{EmailAddress, PlainPassword, User, UserId, Username};
pub use vote::{Vote, VoteDirection, VoteId, VoteReceipt};
pub use vote_service::VoteService;
