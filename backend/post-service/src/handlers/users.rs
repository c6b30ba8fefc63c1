/// User handlers - listing and profile updates
use super::multipart::{read_form, UploadLimits};
use crate::error::{ErrorResponse, Result};
use crate::middleware::UserId;
use crate::models::User;
use crate::services::UserService;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserEnvelope {
    pub message: String,
    pub user: User,
}

/// Multipart body of `PUT /users`
#[derive(ToSchema)]
pub struct ProfileForm {
    /// New email address
    pub email: Option<String>,
    /// New avatar image
    #[schema(value_type = Option<String>, format = Binary)]
    pub avatar: Option<Vec<u8>>,
}

/// List all users, newest first
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses((status = 200, description = "All users", body = Vec<User>))
)]
pub async fn list_users(users: web::Data<UserService>) -> Result<HttpResponse> {
    let users = users.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Update the caller's email and/or avatar
#[utoipa::path(
    put,
    path = "/users",
    tag = "users",
    request_body(content = ProfileForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Profile updated", body = UserEnvelope),
        (status = 400, description = "Invalid email or file", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 413, description = "Avatar too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    users: web::Data<UserService>,
    limits: web::Data<UploadLimits>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = read_form(payload, &["avatar"], *limits.get_ref()).await?;

    let user = users
        .update_profile(user_id.0, form.take_text("email"), form.take_file("avatar"))
        .await?;

    Ok(HttpResponse::Ok().json(UserEnvelope {
        message: "profile updated successfully".to_string(),
        user,
    }))
}
