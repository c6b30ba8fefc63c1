/// Post handlers - HTTP endpoints for post operations
use super::auth::MessageResponse;
use super::multipart::{read_form, UploadLimits};
use crate::error::{ErrorResponse, Result};
use crate::middleware::UserId;
use crate::models::{Post, PostView};
use crate::services::posts::PostUpdate;
use crate::services::PostService;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct PostList {
    pub posts: Vec<PostView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostEnvelope {
    pub message: String,
    pub post: Post,
}

/// Multipart body of `POST /posts` and `PUT /posts/{post_id}`
#[derive(ToSchema)]
pub struct PostForm {
    /// Post text; required on create
    pub content: Option<String>,
    /// Optional image attached to the post
    #[schema(value_type = Option<String>, format = Binary)]
    pub avatar: Option<Vec<u8>>,
}

/// List all posts, newest first, with their authors
#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    responses(
        (status = 200, description = "All posts", body = PostList),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_posts(posts: web::Data<PostService>) -> Result<HttpResponse> {
    let posts = posts.list_posts().await?;
    Ok(HttpResponse::Ok().json(PostList { posts }))
}

/// Create a post with optional image
#[utoipa::path(
    post,
    path = "/posts",
    tag = "posts",
    request_body(content = PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = PostEnvelope),
        (status = 400, description = "Missing content or unsupported file", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 413, description = "Image too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    posts: web::Data<PostService>,
    limits: web::Data<UploadLimits>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = read_form(payload, &["avatar"], *limits.get_ref()).await?;

    let post = posts
        .create_post(user_id.0, form.take_text("content"), form.take_file("avatar"))
        .await?;

    Ok(HttpResponse::Created().json(PostEnvelope {
        message: "post created successfully".to_string(),
        post,
    }))
}

/// Get a post by ID
#[utoipa::path(
    get,
    path = "/posts/{post_id}",
    tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = Post),
        (status = 400, description = "Malformed post id", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_post(posts: web::Data<PostService>, post_id: web::Path<Uuid>) -> Result<HttpResponse> {
    let post = posts.get_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Edit a post's content and/or image (author only)
#[utoipa::path(
    put,
    path = "/posts/{post_id}",
    tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post id")),
    request_body(content = PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Post updated", body = PostEnvelope),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    posts: web::Data<PostService>,
    limits: web::Data<UploadLimits>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = read_form(payload, &["avatar"], *limits.get_ref()).await?;
    let update = PostUpdate {
        content: form.take_text("content"),
        media: form.take_file("avatar"),
    };

    let post = posts
        .update_post(user_id.0, post_id.into_inner(), update)
        .await?;

    Ok(HttpResponse::Ok().json(PostEnvelope {
        message: "post updated successfully".to_string(),
        post,
    }))
}

/// Delete a post and its image (author only)
#[utoipa::path(
    delete,
    path = "/posts/{post_id}",
    tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    posts: web::Data<PostService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    posts.delete_post(user_id.0, post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("post deleted successfully")))
}
