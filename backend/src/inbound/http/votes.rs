//! Votes API handlers.
//!
//! ```text
//! PUT    /api/v1/posts/{id}/vote {"direction":"up"}
//! DELETE /api/v1/posts/{id}/vote
//! ```

use actix_web::{delete, put, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Error, PostId, VoteDirection, VoteReceipt};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `PUT /api/v1/posts/{id}/vote`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// `up` or `down`.
    pub direction: VoteDirection,
}

/// Cast or re-cast the logged-in user's vote on a post.
///
/// A user holds at most one vote per post; voting again replaces the stored
/// direction. The response carries the post's recomputed points.
#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}/vote",
    params(("id" = String, Path, description = "Post identifier")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote stored", body = VoteReceipt),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "No such post", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["votes"],
    operation_id = "vote"
)]
#[put("/posts/{id}/vote")]
pub async fn cast_vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<VoteRequest>,
) -> ApiResult<web::Json<VoteReceipt>> {
    let user = session.require_user_id()?;
    let post = PostId::from_uuid(path.into_inner());
    let receipt = state.votes.cast(user, post, payload.direction).await?;
    Ok(web::Json(receipt))
}

/// Retract the logged-in user's vote on a post.
///
/// Responds `null` without changing anything when no vote exists.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}/vote",
    params(("id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Removed vote and new points, null when absent",
            body = Option<VoteReceipt>),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "No such post", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["votes"],
    operation_id = "deleteVote"
)]
#[delete("/posts/{id}/vote")]
pub async fn retract_vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<Option<VoteReceipt>>> {
    let user = session.require_user_id()?;
    let post = PostId::from_uuid(path.into_inner());
    let receipt = state.votes.retract(user, post).await?;
    Ok(web::Json(receipt))
}
