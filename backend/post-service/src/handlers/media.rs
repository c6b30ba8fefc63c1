/// Standalone image upload
use super::multipart::{read_form, UploadLimits};
use crate::error::{AppError, ErrorResponse, Result};
use crate::middleware::UserId;
use crate::models::MediaRef;
use crate::services::MediaStore;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use utoipa::ToSchema;

/// Multipart body of `POST /upload`
#[derive(ToSchema)]
pub struct ImageForm {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Upload an image and get back its media reference
#[utoipa::path(
    post,
    path = "/upload",
    tag = "media",
    request_body(content = ImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = MediaRef),
        (status = 400, description = "Missing or unsupported file", body = ErrorResponse),
        (status = 413, description = "Image too large", body = ErrorResponse),
        (status = 502, description = "Media host unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload(
    media: web::Data<dyn MediaStore>,
    limits: web::Data<UploadLimits>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = read_form(payload, &["image"], *limits.get_ref()).await?;
    let file = form
        .take_file("image")
        .ok_or_else(|| AppError::BadRequest("an 'image' file is required".to_string()))?;

    let media_ref = media.upload(user_id.0, file).await?;
    Ok(HttpResponse::Created().json(media_ref))
}
