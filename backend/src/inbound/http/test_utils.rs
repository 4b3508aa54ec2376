//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

use crate::domain::{AccountService, PostService, VoteService};
use crate::inbound::http::state::HttpState;
use crate::test_support::memory::{
    FakePasswordHasher, InMemoryPostRepository, InMemoryResetTokenStore, InMemoryUserRepository,
    InMemoryVoteRepository, RecordingMailSender,
};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// In-memory adapters backing a [`memory_state`], exposed so tests can seed
/// rows and inspect stored state directly.
pub struct MemoryBackends {
    /// User store shared with the services.
    pub users: Arc<InMemoryUserRepository>,
    /// Post store shared with the services.
    pub posts: Arc<InMemoryPostRepository>,
    /// Vote store shared with the services.
    pub votes: Arc<InMemoryVoteRepository>,
    /// Captured password-reset mail.
    pub mail: Arc<RecordingMailSender>,
}

/// Build an [`HttpState`] wired entirely to in-memory adapters.
pub fn memory_state() -> (HttpState, MemoryBackends) {
    let users = Arc::new(InMemoryUserRepository::default());
    let posts = Arc::new(InMemoryPostRepository::default());
    let votes = Arc::new(InMemoryVoteRepository::default());
    posts.cascade_votes_into(votes.clone());
    let mail = Arc::new(RecordingMailSender::default());

    let accounts = AccountService::new(
        users.clone(),
        Arc::new(FakePasswordHasher),
        mail.clone(),
        Arc::new(InMemoryResetTokenStore::default()),
    );
    let post_service = PostService::new(posts.clone(), votes.clone(), users.clone());
    let vote_service = VoteService::new(posts.clone(), votes.clone());

    let state = HttpState::new(accounts, post_service, vote_service);
    let backends = MemoryBackends {
        users,
        posts,
        votes,
        mail,
    };
    (state, backends)
}
