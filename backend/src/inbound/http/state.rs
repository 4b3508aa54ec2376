//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::{AccountService, PostService, VoteService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Registration, login, and password recovery.
    pub accounts: Arc<AccountService>,
    /// Post CRUD and the paginated feed.
    pub posts: Arc<PostService>,
    /// Vote casting and retraction.
    pub votes: Arc<VoteService>,
}

impl HttpState {
    /// Bundle the domain services for handler injection.
    pub fn new(accounts: AccountService, posts: PostService, votes: VoteService) -> Self {
        Self {
            accounts: Arc::new(accounts),
            posts: Arc::new(posts),
            votes: Arc::new(votes),
        }
    }
}
