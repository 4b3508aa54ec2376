//! Post domain service: CRUD with ownership guards and the keyset feed.

use std::collections::HashMap;
use std::sync::Arc;

use pagination::{Cursor, Page, clamp_limit, fetch_size};
use tracing::info;

use crate::domain::error::{Error, validation_error};
use crate::domain::ports::{
    PostPersistenceError, PostRepository, UserPersistenceError, UserRepository,
    VotePersistenceError, VoteRepository,
};
use crate::domain::post::{NewPost, Post, PostId, PostPatch};
use crate::domain::user::{User, UserId};
use crate::domain::vote::{VoteDirection, tally};

fn map_post_error(error: PostPersistenceError) -> Error {
    match error {
        PostPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("post repository unavailable: {message}"))
        }
        PostPersistenceError::Query { message } => {
            Error::internal(format!("post repository error: {message}"))
        }
    }
}

fn map_vote_error(error: VotePersistenceError) -> Error {
    match error {
        VotePersistenceError::Connection { message } => {
            Error::service_unavailable(format!("vote repository unavailable: {message}"))
        }
        VotePersistenceError::Query { message } => {
            Error::internal(format!("vote repository error: {message}"))
        }
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        other => Error::internal(format!("user repository error: {other}")),
    }
}

/// A post together with its derived read-model fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    /// The stored post.
    pub post: Post,
    /// Sum of +1/-1 over the post's votes.
    pub points: i64,
    /// The post's author.
    pub author: User,
}

/// One feed entry: a post view plus the requesting user's own vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// The post with points and author resolved.
    pub view: PostView,
    /// The viewer's vote on this post, when logged in and voted.
    pub user_vote: Option<VoteDirection>,
}

/// One keyset page of the feed.
#[derive(Debug, Clone)]
pub struct FeedPage {
    /// Entries on this page, newest first.
    pub entries: Vec<FeedEntry>,
    /// Whether an older post exists beyond this page.
    pub has_more: bool,
    /// Opaque cursor for the follow-up request, present when `has_more`.
    pub next_cursor: Option<Cursor>,
}

/// Post operations: create/update/delete with ownership guards, single-post
/// reads, and the paginated feed with batch-loaded points and authors.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    votes: Arc<dyn VoteRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    /// Assemble the service from its driven ports.
    pub fn new(
        posts: Arc<dyn PostRepository>,
        votes: Arc<dyn VoteRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            posts,
            votes,
            users,
        }
    }

    /// Create a post owned by `author`.
    pub async fn create(
        &self,
        author: UserId,
        title: String,
        body: String,
    ) -> Result<Post, Error> {
        let new_post = NewPost::new(title, body)
            .map_err(|violations| validation_error("invalid post", violations))?;

        let post = self
            .posts
            .insert(author, new_post)
            .await
            .map_err(map_post_error)?;
        info!(post_id = %post.id, author_id = %author, "post created");
        Ok(post)
    }

    /// Update a post the caller owns. Returns `None`, leaving the post
    /// unchanged, when it is missing or owned by someone else.
    pub async fn update(
        &self,
        acting: UserId,
        id: PostId,
        patch: PostPatch,
    ) -> Result<Option<Post>, Error> {
        patch
            .validate()
            .map_err(|violations| validation_error("invalid post", violations))?;
        if patch.is_empty() {
            // Nothing to write; still answer with the post iff owned.
            let post = self.posts.find_by_id(id).await.map_err(map_post_error)?;
            return Ok(post.filter(|post| post.author_id == acting));
        }

        self.posts
            .update_owned(id, acting, patch)
            .await
            .map_err(map_post_error)
    }

    /// Delete a post the caller owns; votes cascade. Returns whether a post
    /// was deleted (false for missing or non-owned posts).
    pub async fn delete(&self, acting: UserId, id: PostId) -> Result<bool, Error> {
        let deleted = self
            .posts
            .delete_owned(id, acting)
            .await
            .map_err(map_post_error)?;
        if deleted {
            info!(post_id = %id, author_id = %acting, "post deleted");
        }
        Ok(deleted)
    }

    /// Fetch a single post with points and author resolved.
    pub async fn get(&self, id: PostId) -> Result<Option<PostView>, Error> {
        let Some(post) = self.posts.find_by_id(id).await.map_err(map_post_error)? else {
            return Ok(None);
        };

        let mut views = self.assemble_views(vec![post]).await?;
        Ok(views.pop())
    }

    /// One keyset page of the feed: posts strictly older than the cursor,
    /// newest first, the limit clamped to the hard cap. One extra row is
    /// fetched to derive `has_more` without a count query.
    pub async fn feed(
        &self,
        viewer: Option<UserId>,
        limit: Option<i64>,
        cursor: Option<Cursor>,
    ) -> Result<FeedPage, Error> {
        let limit = clamp_limit(limit);
        let rows = self
            .posts
            .feed_page(cursor.map(|c| c.created_at()), fetch_size(limit))
            .await
            .map_err(map_post_error)?;

        let page = Page::from_over_fetched(rows, limit, |post| Cursor::new(post.created_at));
        let post_ids: Vec<PostId> = page.items.iter().map(|post| post.id).collect();

        let mut user_votes = match viewer {
            Some(viewer) => self
                .votes
                .user_votes_for_posts(viewer, &post_ids)
                .await
                .map_err(map_vote_error)?,
            None => HashMap::new(),
        };

        let views = self.assemble_views(page.items).await?;
        let entries = views
            .into_iter()
            .map(|view| {
                let user_vote = user_votes.remove(&view.post.id);
                FeedEntry { view, user_vote }
            })
            .collect();

        Ok(FeedPage {
            entries,
            has_more: page.has_more,
            next_cursor: page.next_cursor,
        })
    }

    /// Resolve points and authors for a batch of posts, preserving order.
    /// Both lookups are single grouped queries per page.
    async fn assemble_views(&self, posts: Vec<Post>) -> Result<Vec<PostView>, Error> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
        let mut directions = self
            .votes
            .directions_for_posts(&post_ids)
            .await
            .map_err(map_vote_error)?;

        let mut author_ids: Vec<UserId> = posts.iter().map(|post| post.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let authors: HashMap<UserId, User> = self
            .users
            .find_by_ids(&author_ids)
            .await
            .map_err(map_user_error)?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        posts
            .into_iter()
            .map(|post| {
                let points = tally(directions.remove(&post.id).unwrap_or_default());
                let author = authors
                    .get(&post.author_id)
                    .cloned()
                    .ok_or_else(|| Error::internal("post author missing from user table"))?;
                Ok(PostView {
                    post,
                    points,
                    author,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for ownership guards and feed assembly.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::test_support::memory::{
        InMemoryPostRepository, InMemoryUserRepository, InMemoryVoteRepository, seeded_user,
    };
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    struct Fixture {
        service: PostService,
        posts: Arc<InMemoryPostRepository>,
        votes: Arc<InMemoryVoteRepository>,
        users: Arc<InMemoryUserRepository>,
    }

    fn fixture() -> Fixture {
        let posts = Arc::new(InMemoryPostRepository::default());
        let votes = Arc::new(InMemoryVoteRepository::default());
        let users = Arc::new(InMemoryUserRepository::default());
        posts.cascade_votes_into(votes.clone());
        let service = PostService::new(posts.clone(), votes.clone(), users.clone());
        Fixture {
            service,
            posts,
            votes,
            users,
        }
    }

    fn seed_author(fixture: &Fixture, username: &str) -> User {
        let user = seeded_user(username);
        fixture.users.seed(user.clone(), "irrelevant-hash");
        user
    }

    #[tokio::test]
    async fn create_rejects_blank_title_and_body_together() {
        let fixture = fixture();
        let author = seed_author(&fixture, "ada");

        let err = fixture
            .service
            .create(author.id, "  ".into(), String::new())
            .await
            .expect_err("blank input");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let errors = err.details().expect("details")["errors"]
            .as_array()
            .expect("errors array")
            .len();
        assert_eq!(errors, 2);
        assert!(fixture.posts.is_empty());
    }

    #[tokio::test]
    async fn update_by_non_owner_changes_nothing_and_returns_none() {
        let fixture = fixture();
        let owner = seed_author(&fixture, "ada");
        let intruder = seed_author(&fixture, "eve");
        let post = fixture
            .service
            .create(owner.id, "title".into(), "body".into())
            .await
            .expect("created");

        let patch = PostPatch {
            title: Some("hijacked".into()),
            body: None,
        };
        let outcome = fixture
            .service
            .update(intruder.id, post.id, patch)
            .await
            .expect("no repository error");

        assert!(outcome.is_none());
        let stored = fixture.posts.get(post.id).expect("post still present");
        assert_eq!(stored.title, "title");
    }

    #[tokio::test]
    async fn update_by_owner_applies_the_patch() {
        let fixture = fixture();
        let owner = seed_author(&fixture, "ada");
        let post = fixture
            .service
            .create(owner.id, "title".into(), "body".into())
            .await
            .expect("created");

        let patch = PostPatch {
            title: Some("new title".into()),
            body: Some("new body".into()),
        };
        let updated = fixture
            .service
            .update(owner.id, post.id, patch)
            .await
            .expect("no repository error")
            .expect("owner may update");

        assert_eq!(updated.title, "new title");
        assert_eq!(updated.body, "new body");
    }

    #[tokio::test]
    async fn update_rejects_blanking_the_title() {
        let fixture = fixture();
        let owner = seed_author(&fixture, "ada");
        let post = fixture
            .service
            .create(owner.id, "title".into(), "body".into())
            .await
            .expect("created");

        let patch = PostPatch {
            title: Some("  ".into()),
            body: None,
        };
        let err = fixture
            .service
            .update(owner.id, post.id, patch)
            .await
            .expect_err("blank title");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let stored = fixture.posts.get(post.id).expect("post still present");
        assert_eq!(stored.title, "title");
    }

    #[tokio::test]
    async fn delete_by_non_owner_returns_false_and_keeps_the_post() {
        let fixture = fixture();
        let owner = seed_author(&fixture, "ada");
        let intruder = seed_author(&fixture, "eve");
        let post = fixture
            .service
            .create(owner.id, "title".into(), "body".into())
            .await
            .expect("created");

        let deleted = fixture
            .service
            .delete(intruder.id, post.id)
            .await
            .expect("no repository error");

        assert!(!deleted);
        assert!(fixture.posts.get(post.id).is_some());
    }

    #[tokio::test]
    async fn delete_by_owner_cascades_to_votes() {
        let fixture = fixture();
        let owner = seed_author(&fixture, "ada");
        let post = fixture
            .service
            .create(owner.id, "title".into(), "body".into())
            .await
            .expect("created");
        fixture
            .votes
            .upsert(owner.id, post.id, VoteDirection::Up)
            .await
            .expect("vote stored");

        let deleted = fixture
            .service
            .delete(owner.id, post.id)
            .await
            .expect("no repository error");

        assert!(deleted);
        assert!(fixture.posts.get(post.id).is_none());
        assert_eq!(fixture.votes.count_for_post(post.id), 0);
    }

    #[tokio::test]
    async fn get_resolves_points_and_author() {
        let fixture = fixture();
        let author = seed_author(&fixture, "ada");
        let voter = seed_author(&fixture, "bob");
        let post = fixture
            .service
            .create(author.id, "title".into(), "a body long enough to truncate".into())
            .await
            .expect("created");
        fixture
            .votes
            .upsert(author.id, post.id, VoteDirection::Up)
            .await
            .expect("vote stored");
        fixture
            .votes
            .upsert(voter.id, post.id, VoteDirection::Up)
            .await
            .expect("vote stored");

        let view = fixture
            .service
            .get(post.id)
            .await
            .expect("no repository error")
            .expect("post exists");

        assert_eq!(view.points, 2);
        assert_eq!(view.author.id, author.id);
    }

    #[rstest]
    #[tokio::test]
    async fn feed_pages_by_creation_time_with_over_fetch() {
        let fixture = fixture();
        let author = seed_author(&fixture, "ada");
        let t1 = Utc.timestamp_opt(1_000, 0).single().expect("t1");
        let t2 = Utc.timestamp_opt(2_000, 0).single().expect("t2");
        let t3 = Utc.timestamp_opt(3_000, 0).single().expect("t3");
        for (title, at) in [("first", t1), ("second", t2), ("third", t3)] {
            fixture.posts.seed_at(author.id, title, "body", at);
        }

        let first_page = fixture
            .service
            .feed(None, Some(2), None)
            .await
            .expect("first page");
        let titles: Vec<&str> = first_page
            .entries
            .iter()
            .map(|entry| entry.view.post.title.as_str())
            .collect();
        assert_eq!(titles, vec!["third", "second"]);
        assert!(first_page.has_more);
        let cursor = first_page.next_cursor.expect("cursor for next page");

        let second_page = fixture
            .service
            .feed(None, Some(2), Some(cursor))
            .await
            .expect("second page");
        let titles: Vec<&str> = second_page
            .entries
            .iter()
            .map(|entry| entry.view.post.title.as_str())
            .collect();
        assert_eq!(titles, vec!["first"]);
        assert!(!second_page.has_more);
        assert!(second_page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn feed_annotates_the_viewers_own_votes() {
        let fixture = fixture();
        let author = seed_author(&fixture, "ada");
        let viewer = seed_author(&fixture, "bob");
        let voted = fixture
            .service
            .create(author.id, "voted".into(), "body".into())
            .await
            .expect("created");
        fixture
            .service
            .create(author.id, "unvoted".into(), "body".into())
            .await
            .expect("created");
        fixture
            .votes
            .upsert(viewer.id, voted.id, VoteDirection::Down)
            .await
            .expect("vote stored");

        let page = fixture
            .service
            .feed(Some(viewer.id), None, None)
            .await
            .expect("feed");

        let by_title: HashMap<&str, Option<VoteDirection>> = page
            .entries
            .iter()
            .map(|entry| (entry.view.post.title.as_str(), entry.user_vote))
            .collect();
        assert_eq!(by_title["voted"], Some(VoteDirection::Down));
        assert_eq!(by_title["unvoted"], None);
    }

    #[tokio::test]
    async fn feed_clamps_oversized_limits() {
        let fixture = fixture();
        let author = seed_author(&fixture, "ada");
        for index in 0..60 {
            let at = Utc
                .timestamp_opt(10_000 + index, 0)
                .single()
                .expect("timestamp");
            fixture.posts.seed_at(author.id, "post", "body", at);
        }

        let page = fixture
            .service
            .feed(None, Some(500), None)
            .await
            .expect("feed");

        assert_eq!(page.entries.len(), 50);
        assert!(page.has_more);
    }
}
