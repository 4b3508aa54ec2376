//! Posts API handlers.
//!
//! ```text
//! GET    /api/v1/posts?limit=20&cursor=...
//! GET    /api/v1/posts/{id}
//! POST   /api/v1/posts {"title":"...","text":"..."}
//! PATCH  /api/v1/posts/{id} {"title":"..."}
//! DELETE /api/v1/posts/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use pagination::Cursor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Error, PostId, PostPatch, PostView, User, VoteDirection,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/posts` and `PATCH /api/v1/posts/{id}`.
///
/// On create both fields are required; on patch, absent fields keep their
/// stored value.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    /// Post headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Full post body.
    #[serde(default)]
    pub text: Option<String>,
}

/// Query parameters for `GET /api/v1/posts`.
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    /// Page size, clamped server-side to at most 50.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Opaque cursor from a previous page's `nextCursor`.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// A post on the feed: truncated body, points, author, and the requesting
/// user's own vote.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    /// Stable identifier.
    #[schema(value_type = String)]
    pub id: PostId,
    /// Post headline.
    pub title: String,
    /// First 47 characters of the body with a trailing ellipsis.
    pub text_snippet: String,
    /// Sum of up and down votes.
    pub points: i64,
    /// The requesting user's vote, when logged in and voted.
    pub user_vote: Option<VoteDirection>,
    /// The post's author.
    pub author: User,
    /// Creation timestamp, also the feed's sort key.
    pub created_at: DateTime<Utc>,
}

/// One page of the feed.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    /// Posts on this page, newest first.
    pub posts: Vec<FeedPost>,
    /// Whether an older post exists beyond this page.
    pub has_more: bool,
    /// Opaque cursor for the follow-up request, present when `hasMore`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// A single post with its full body.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    /// Stable identifier.
    #[schema(value_type = String)]
    pub id: PostId,
    /// Post headline.
    pub title: String,
    /// Full post body.
    pub text: String,
    /// Sum of up and down votes.
    pub points: i64,
    /// The post's author.
    pub author: User,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<PostView> for PostResponse {
    fn from(view: PostView) -> Self {
        Self {
            id: view.post.id,
            title: view.post.title,
            text: view.post.body,
            points: view.points,
            author: view.author,
            created_at: view.post.created_at,
            updated_at: view.post.updated_at,
        }
    }
}

fn decode_cursor(raw: Option<&str>) -> Result<Option<Cursor>, Error> {
    raw.map(|token| {
        Cursor::decode(token)
            .map_err(|err| Error::invalid_request(format!("invalid cursor: {err}")))
    })
    .transpose()
}

/// One page of the feed, newest first.
///
/// Anonymous requests are served without `userVote` annotations. The limit
/// is clamped to 50; `hasMore` reports whether an older post exists.
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(FeedQuery),
    responses(
        (status = 200, description = "A feed page", body = FeedResponse),
        (status = 400, description = "Malformed cursor", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["posts"],
    operation_id = "posts",
    security([])
)]
#[get("/posts")]
pub async fn feed(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<FeedQuery>,
) -> ApiResult<web::Json<FeedResponse>> {
    let viewer = session.user_id()?;
    let cursor = decode_cursor(query.cursor.as_deref())?;

    let page = state.posts.feed(viewer, query.limit, cursor).await?;
    let posts = page
        .entries
        .into_iter()
        .map(|entry| FeedPost {
            id: entry.view.post.id,
            title: entry.view.post.title.clone(),
            text_snippet: entry.view.post.text_snippet(),
            points: entry.view.points,
            user_vote: entry.user_vote,
            author: entry.view.author,
            created_at: entry.view.post.created_at,
        })
        .collect();

    Ok(web::Json(FeedResponse {
        posts,
        has_more: page.has_more,
        next_cursor: page.next_cursor.map(|cursor| cursor.encode()),
    }))
}

/// Fetch a single post with its full body.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "The post", body = PostResponse),
        (status = 404, description = "No such post", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["posts"],
    operation_id = "post",
    security([])
)]
#[get("/posts/{id}")]
pub async fn get_post(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<PostResponse>> {
    let id = PostId::from_uuid(path.into_inner());
    let view = state
        .posts
        .get(id)
        .await?
        .ok_or_else(|| Error::not_found("no such post"))?;
    Ok(web::Json(view.into()))
}

/// Create a post owned by the logged-in user.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = PostInput,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Blank title or text", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["posts"],
    operation_id = "createPost"
)]
#[post("/posts")]
pub async fn create_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PostInput>,
) -> ApiResult<HttpResponse> {
    let author = session.require_user_id()?;
    let PostInput { title, text } = payload.into_inner();

    let post = state
        .posts
        .create(
            author,
            title.unwrap_or_default(),
            text.unwrap_or_default(),
        )
        .await?;
    let view = state
        .posts
        .get(post.id)
        .await?
        .ok_or_else(|| Error::internal("created post vanished"))?;
    Ok(HttpResponse::Created().json(PostResponse::from(view)))
}

/// Update a post the logged-in user owns.
///
/// Posts owned by someone else answer `404` and stay unchanged, the same as
/// posts that do not exist.
#[utoipa::path(
    patch,
    path = "/api/v1/posts/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    request_body = PostInput,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Blank title or text", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "No such post owned by the caller", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["posts"],
    operation_id = "updatePost"
)]
#[patch("/posts/{id}")]
pub async fn update_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<PostInput>,
) -> ApiResult<web::Json<PostResponse>> {
    let acting = session.require_user_id()?;
    let id = PostId::from_uuid(path.into_inner());
    let PostInput { title, text } = payload.into_inner();
    let patch = PostPatch { title, body: text };

    state
        .posts
        .update(acting, id, patch)
        .await?
        .ok_or_else(|| Error::not_found("no such post"))?;
    let view = state
        .posts
        .get(id)
        .await?
        .ok_or_else(|| Error::internal("updated post vanished"))?;
    Ok(web::Json(view.into()))
}

/// Delete a post the logged-in user owns; its votes go with it.
///
/// Responds `false` without deleting anything when the post is missing or
/// owned by someone else.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Whether a post was deleted", body = bool),
        (status = 401, description = "Not logged in", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["posts"],
    operation_id = "deletePost"
)]
#[delete("/posts/{id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<bool>> {
    let acting = session.require_user_id()?;
    let id = PostId::from_uuid(path.into_inner());
    let deleted = state.posts.delete(acting, id).await?;
    Ok(web::Json(deleted))
}
