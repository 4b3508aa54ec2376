//! In-memory implementations of the driven ports.
//!
//! Each adapter holds its rows behind a `Mutex` so tests can share it via
//! `Arc` with the service under test and inspect state afterwards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    MailError, MailSender, NewUserRecord, PasswordHashError, PasswordHasher,
    PostPersistenceError, PostRepository, UserPersistenceError, UserRecord, UserRepository,
    VotePersistenceError, VoteRepository,
};
use crate::domain::post::{NewPost, Post, PostId, PostPatch};
use crate::domain::user::{EmailAddress, PlainPassword, User, UserId, Username};
use crate::domain::vote::{Vote, VoteDirection, VoteId};

pub use crate::outbound::reset_tokens::InMemoryResetTokenStore;

/// Build a user with a derived example.com email and fresh timestamps.
///
/// # Panics
/// Panics when `username` fails domain validation; fixtures should pass
/// valid names.
#[must_use]
pub fn seeded_user(username: &str) -> User {
    let now = Utc::now();
    User {
        id: UserId::random(),
        username: Username::new(username).expect("fixture username is valid"),
        email: EmailAddress::new(format!("{username}@example.com"))
            .expect("fixture email is valid"),
        created_at: now,
        updated_at: now,
    }
}

/// Deterministic stand-in for the Argon2 adapter. The marker prefix keeps
/// assertions honest about never storing the plain password.
pub struct FakePasswordHasher;

impl PasswordHasher for FakePasswordHasher {
    fn hash(&self, password: &PlainPassword) -> Result<String, PasswordHashError> {
        Ok(format!("fake-hash:{}", password.expose()))
    }

    fn verify(&self, stored_hash: &str, candidate: &str) -> bool {
        stored_hash == format!("fake-hash:{candidate}")
    }
}

/// Mail sender that records `(recipient, token)` pairs instead of sending.
#[derive(Default)]
pub struct RecordingMailSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailSender {
    /// Every reset mail handed to the sender so far, oldest first.
    ///
    /// # Panics
    /// Panics when the inner lock is poisoned.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("mail lock").clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailSender {
    async fn send_password_reset(
        &self,
        recipient: &EmailAddress,
        reset_token: &str,
    ) -> Result<(), MailError> {
        self.sent
            .lock()
            .expect("mail lock")
            .push((recipient.as_ref().to_owned(), reset_token.to_owned()));
        Ok(())
    }
}

/// User store backed by a `Vec`, with the same duplicate semantics as the
/// database's unique constraints.
#[derive(Default)]
pub struct InMemoryUserRepository {
    records: Mutex<Vec<UserRecord>>,
}

impl InMemoryUserRepository {
    /// Insert a pre-built user, bypassing registration validation.
    pub fn seed(&self, user: User, password_hash: &str) {
        self.records.lock().expect("user lock").push(UserRecord {
            user,
            password_hash: password_hash.to_owned(),
        });
    }

    /// Look up a stored record for assertions.
    #[must_use]
    pub fn record_by_username(&self, username: &str) -> Option<UserRecord> {
        self.records
            .lock()
            .expect("user lock")
            .iter()
            .find(|record| record.user.username.as_ref() == username)
            .cloned()
    }

    /// Whether no user has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().expect("user lock").is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, new_user: NewUserRecord) -> Result<User, UserPersistenceError> {
        let mut records = self.records.lock().expect("user lock");
        if records
            .iter()
            .any(|record| record.user.username == new_user.username)
        {
            return Err(UserPersistenceError::DuplicateUsername);
        }
        if records
            .iter()
            .any(|record| record.user.email == new_user.email)
        {
            return Err(UserPersistenceError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: UserId::random(),
            username: new_user.username,
            email: new_user.email,
            created_at: now,
            updated_at: now,
        };
        records.push(UserRecord {
            user: user.clone(),
            password_hash: new_user.password_hash,
        });
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .records
            .lock()
            .expect("user lock")
            .iter()
            .find(|record| record.user.id == id)
            .map(|record| record.user.clone()))
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        Ok(self
            .records
            .lock()
            .expect("user lock")
            .iter()
            .filter(|record| ids.contains(&record.user.id))
            .map(|record| record.user.clone())
            .collect())
    }

    async fn find_record_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        Ok(self.record_by_username(username))
    }

    async fn find_record_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        Ok(self
            .records
            .lock()
            .expect("user lock")
            .iter()
            .find(|record| record.user.email.as_ref() == email)
            .cloned())
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), UserPersistenceError> {
        let mut records = self.records.lock().expect("user lock");
        let record = records
            .iter_mut()
            .find(|record| record.user.id == id)
            .ok_or_else(|| UserPersistenceError::query("user not found"))?;
        record.password_hash = password_hash;
        record.user.updated_at = Utc::now();
        Ok(())
    }
}

/// Vote store backed by a `Vec`, upholding the one-vote-per-(user, post)
/// invariant the database enforces with its unique constraint.
#[derive(Default)]
pub struct InMemoryVoteRepository {
    votes: Mutex<Vec<Vote>>,
}

impl InMemoryVoteRepository {
    /// Number of stored votes for a post, for row-count assertions.
    #[must_use]
    pub fn count_for_post(&self, post: PostId) -> usize {
        self.votes
            .lock()
            .expect("vote lock")
            .iter()
            .filter(|vote| vote.post_id == post)
            .count()
    }

    fn remove_for_post(&self, post: PostId) {
        self.votes
            .lock()
            .expect("vote lock")
            .retain(|vote| vote.post_id != post);
    }
}

#[async_trait]
impl VoteRepository for InMemoryVoteRepository {
    async fn upsert(
        &self,
        user: UserId,
        post: PostId,
        direction: VoteDirection,
    ) -> Result<Vote, VotePersistenceError> {
        let mut votes = self.votes.lock().expect("vote lock");
        if let Some(existing) = votes
            .iter_mut()
            .find(|vote| vote.user_id == user && vote.post_id == post)
        {
            existing.direction = direction;
            return Ok(existing.clone());
        }

        let vote = Vote {
            id: VoteId::random(),
            post_id: post,
            user_id: user,
            direction,
        };
        votes.push(vote.clone());
        Ok(vote)
    }

    async fn delete(
        &self,
        user: UserId,
        post: PostId,
    ) -> Result<Option<VoteId>, VotePersistenceError> {
        let mut votes = self.votes.lock().expect("vote lock");
        let Some(index) = votes
            .iter()
            .position(|vote| vote.user_id == user && vote.post_id == post)
        else {
            return Ok(None);
        };
        Ok(Some(votes.swap_remove(index).id))
    }

    async fn directions_for_posts(
        &self,
        post_ids: &[PostId],
    ) -> Result<HashMap<PostId, Vec<VoteDirection>>, VotePersistenceError> {
        let votes = self.votes.lock().expect("vote lock");
        let mut grouped: HashMap<PostId, Vec<VoteDirection>> = HashMap::new();
        for vote in votes.iter().filter(|vote| post_ids.contains(&vote.post_id)) {
            grouped.entry(vote.post_id).or_default().push(vote.direction);
        }
        Ok(grouped)
    }

    async fn user_votes_for_posts(
        &self,
        user: UserId,
        post_ids: &[PostId],
    ) -> Result<HashMap<PostId, VoteDirection>, VotePersistenceError> {
        let votes = self.votes.lock().expect("vote lock");
        Ok(votes
            .iter()
            .filter(|vote| vote.user_id == user && post_ids.contains(&vote.post_id))
            .map(|vote| (vote.post_id, vote.direction))
            .collect())
    }
}

/// Post store backed by a `Vec`. Wire a vote repository in with
/// [`InMemoryPostRepository::cascade_votes_into`] to mirror the database's
/// `ON DELETE CASCADE` on votes.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: Mutex<Vec<Post>>,
    cascade: Mutex<Option<Arc<InMemoryVoteRepository>>>,
}

impl InMemoryPostRepository {
    /// Delete this post's votes from `votes` whenever a post is deleted.
    pub fn cascade_votes_into(&self, votes: Arc<InMemoryVoteRepository>) {
        *self.cascade.lock().expect("cascade lock") = Some(votes);
    }

    /// Insert a post created now.
    pub fn seed(&self, author: UserId, title: &str, body: &str) -> Post {
        self.seed_at(author, title, body, Utc::now())
    }

    /// Insert a post with a controlled creation time, for keyset tests.
    pub fn seed_at(
        &self,
        author: UserId,
        title: &str,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> Post {
        let post = Post {
            id: PostId::random(),
            title: title.to_owned(),
            body: body.to_owned(),
            author_id: author,
            created_at,
            updated_at: created_at,
        };
        self.posts.lock().expect("post lock").push(post.clone());
        post
    }

    /// Look up a stored post for assertions.
    #[must_use]
    pub fn get(&self, id: PostId) -> Option<Post> {
        self.posts
            .lock()
            .expect("post lock")
            .iter()
            .find(|post| post.id == id)
            .cloned()
    }

    /// Whether no post has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.lock().expect("post lock").is_empty()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn insert(
        &self,
        author: UserId,
        new_post: NewPost,
    ) -> Result<Post, PostPersistenceError> {
        Ok(self.seed(author, &new_post.title, &new_post.body))
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostPersistenceError> {
        Ok(self.get(id))
    }

    async fn update_owned(
        &self,
        id: PostId,
        owner: UserId,
        patch: PostPatch,
    ) -> Result<Option<Post>, PostPersistenceError> {
        let mut posts = self.posts.lock().expect("post lock");
        let Some(post) = posts
            .iter_mut()
            .find(|post| post.id == id && post.author_id == owner)
        else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(body) = patch.body {
            post.body = body;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_owned(&self, id: PostId, owner: UserId) -> Result<bool, PostPersistenceError> {
        let mut posts = self.posts.lock().expect("post lock");
        let before = posts.len();
        posts.retain(|post| !(post.id == id && post.author_id == owner));
        let deleted = posts.len() < before;
        drop(posts);

        if deleted
            && let Some(votes) = self.cascade.lock().expect("cascade lock").clone()
        {
            votes.remove_for_post(id);
        }
        Ok(deleted)
    }

    async fn feed_page(
        &self,
        older_than: Option<DateTime<Utc>>,
        fetch: i64,
    ) -> Result<Vec<Post>, PostPersistenceError> {
        let mut rows: Vec<Post> = self
            .posts
            .lock()
            .expect("post lock")
            .iter()
            .filter(|post| older_than.is_none_or(|bound| post.created_at < bound))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(usize::try_from(fetch).unwrap_or_default());
        Ok(rows)
    }
}
