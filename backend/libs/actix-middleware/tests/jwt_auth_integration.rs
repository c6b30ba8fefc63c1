use actix_middleware::{JwtAuthMiddleware, UserId};
use actix_web::{http::StatusCode, test, web, App, HttpResponse};
use crypto_core::testing::test_jwt_keys;
use crypto_core::IdentityResolver;
use std::sync::Arc;
use uuid::Uuid;

/// Echoes the resolved user id
async fn whoami(user_id: UserId) -> HttpResponse {
    HttpResponse::Ok().body(user_id.0.to_string())
}

fn resolver() -> Arc<dyn IdentityResolver> {
    Arc::new(test_jwt_keys())
}

#[actix_web::test]
async fn test_valid_token_reaches_handler() {
    let keys = test_jwt_keys();
    let user_id = Uuid::new_v4();
    let token = keys.issue_access_token(user_id, "test@example.com").unwrap();

    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(resolver()))
            .route("/me", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", format!("Bearer {}", token.access_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body, user_id.to_string().as_bytes());
}

#[actix_web::test]
async fn test_missing_header_is_unauthorized() {
    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(resolver()))
            .route("/me", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get().uri("/me").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 401);
}

#[actix_web::test]
async fn test_wrong_scheme_is_unauthorized() {
    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(resolver()))
            .route("/me", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_garbage_token_is_unauthorized() {
    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(resolver()))
            .route("/me", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/me")
        .insert_header(("Authorization", "Bearer not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_extractor_without_middleware_is_unauthorized() {
    let app = test::init_service(App::new().route("/me", web::get().to(whoami))).await;

    let req = test::TestRequest::get().uri("/me").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
