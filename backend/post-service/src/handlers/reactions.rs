/// Reaction handlers - like/dislike toggling on posts
use crate::domain::ReactionSummary;
use crate::error::{ErrorResponse, Result};
use crate::middleware::UserId;
use crate::models::ReactionRequest;
use crate::services::ReactionService;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// Like or dislike a post.
///
/// Voting the same kind again withdraws the vote; voting the other kind
/// switches it.
#[utoipa::path(
    post,
    path = "/posts/{post_id}/reactions",
    tag = "reactions",
    params(("post_id" = Uuid, Path, description = "Post id")),
    request_body = ReactionRequest,
    responses(
        (status = 200, description = "Updated reactions", body = ReactionSummary),
        (status = 400, description = "Unknown vote kind", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 409, description = "Too many concurrent votes, retry", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn react(
    reactions: web::Data<ReactionService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    payload: web::Json<ReactionRequest>,
) -> Result<HttpResponse> {
    let summary = reactions
        .react(post_id.into_inner(), user_id.0, &payload.kind)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Current reactions on a post
#[utoipa::path(
    get,
    path = "/posts/{post_id}/reactions",
    tag = "reactions",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Reactions with the caller's vote", body = ReactionSummary),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_reactions(
    reactions: web::Data<ReactionService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let summary = reactions.summary(post_id.into_inner(), user_id.0).await?;
    Ok(HttpResponse::Ok().json(summary))
}
