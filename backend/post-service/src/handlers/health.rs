use crate::services::PostService;
use actix_web::{web, HttpResponse};

/// Root greeting
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Greeting", body = String))
)]
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain; charset=utf-8").body("hello world")
}

/// Liveness plus a round-trip to the record store
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy"),
        (status = 503, description = "Record store unreachable")
    )
)]
pub async fn health(posts: web::Data<PostService>) -> HttpResponse {
    match posts.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "post-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "post-service",
                "version": env!("CARGO_PKG_VERSION")
            }))
        }
    }
}
