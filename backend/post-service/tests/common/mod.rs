//! Shared fixtures: an app wired to in-memory stores and the test RSA keys
#![allow(dead_code)]

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, App};
use crypto_core::testing::test_jwt_keys;
use crypto_core::JwtKeys;
use post_service::db::InMemoryStore;
use post_service::handlers::{self, UploadLimits};
use post_service::services::{AppServices, InMemoryMediaStore};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub const BOUNDARY: &str = "----post-service-test-boundary";
pub const TEST_UPLOAD_LIMIT: usize = 1024;

pub struct TestContext {
    pub services: AppServices,
    pub store: Arc<InMemoryStore>,
    pub media: Arc<InMemoryMediaStore>,
    pub keys: Arc<JwtKeys>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let media = Arc::new(InMemoryMediaStore::new());
        let keys = Arc::new(test_jwt_keys());
        let services = AppServices::new(store.clone(), store.clone(), media.clone(), keys.clone(), 5);

        Self {
            services,
            store,
            media,
            keys,
        }
    }

    pub fn limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_bytes: TEST_UPLOAD_LIMIT,
        }
    }
}

pub async fn init_app(
    ctx: &TestContext,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let services = ctx.services.clone();
    let limits = ctx.limits();
    test::init_service(App::new().configure(|cfg| handlers::configure(cfg, &services, limits))).await
}

/// Build a `multipart/form-data` body; returns (content type, body)
pub fn multipart_body(texts: &[(&str, &str)], files: &[FilePart<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    for (name, value) in texts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for file in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                file.field, file.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

pub fn png(field: &str) -> FilePart<'_> {
    FilePart {
        field,
        filename: "pic.png",
        content_type: "image/png",
        bytes: b"\x89PNG\r\n\x1a\nfake",
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Register through the API and sign in, returning (user id, access token)
pub async fn register<S>(app: &S, full_name: &str, email: &str) -> (Uuid, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/auth/sign-up")
        .set_json(serde_json::json!({
            "fullName": full_name,
            "email": email,
            "password": "password123",
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status().as_u16(), 201, "sign-up failed for {email}");

    let req = test::TestRequest::post()
        .uri("/auth/sign-in")
        .set_json(serde_json::json!({ "email": email, "password": "password123" }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status().as_u16(), 200, "sign-in failed for {email}");
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/auth/current-user")
        .insert_header(bearer(&token))
        .to_request();
    let user: Value = test::call_and_read_body_json(app, req).await;
    let id = user["id"].as_str().unwrap().parse().unwrap();

    (id, token)
}

/// Create a text post through the API, returning its id
pub async fn create_post<S>(app: &S, token: &str, content: &str) -> Uuid
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (content_type, body) = multipart_body(&[("content", content)], &[]);
    let req = test::TestRequest::post()
        .uri("/posts")
        .insert_header(bearer(token))
        .insert_header(("Content-Type", content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status().as_u16(), 201);

    let body: Value = test::read_body_json(resp).await;
    body["post"]["id"].as_str().unwrap().parse().unwrap()
}
