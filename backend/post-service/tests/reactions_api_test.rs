/// HTTP tests for the like/dislike endpoints
mod common;

use actix_web::test;
use common::{bearer, create_post, init_app, register, TestContext};
use post_service::db::PostStore;
use serde_json::{json, Value};
use uuid::Uuid;

#[actix_web::test]
async fn test_like_like_dislike_like() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    let (user_id, token) = register(&app, "Ada", "ada@example.com").await;
    let post_id = create_post(&app, &token, "vote on me").await;
    let me = user_id.to_string();

    let expected = [
        ("like", json!([me]), json!([]), json!("like")),
        ("like", json!([]), json!([]), Value::Null),
        ("dislike", json!([]), json!([me]), json!("dislike")),
        ("like", json!([me]), json!([]), json!("like")),
    ];

    for (kind, likes, dislikes, viewer) in expected {
        let req = test::TestRequest::post()
            .uri(&format!("/posts/{post_id}/reactions"))
            .insert_header(bearer(&token))
            .set_json(json!({ "kind": kind }))
            .to_request();
        let summary: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(summary["post_id"], post_id.to_string());
        assert_eq!(summary["likes"], likes, "after {kind}");
        assert_eq!(summary["dislikes"], dislikes, "after {kind}");
        assert_eq!(summary["viewer_reaction"], viewer, "after {kind}");
    }

    let stored = ctx.store.load_post(post_id).await.unwrap();
    assert_eq!(stored.version, 5);
    assert!(stored.reactions.likes().contains(&user_id));
}

#[actix_web::test]
async fn test_votes_from_different_users_are_independent() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    let (ada_id, ada) = register(&app, "Ada", "ada@example.com").await;
    let (bob_id, bob) = register(&app, "Bob", "bob@example.com").await;
    let post_id = create_post(&app, &ada, "two voters").await;

    for (token, kind) in [(&ada, "like"), (&bob, "dislike")] {
        let req = test::TestRequest::post()
            .uri(&format!("/posts/{post_id}/reactions"))
            .insert_header(bearer(token))
            .set_json(json!({ "kind": kind }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}/reactions"))
        .insert_header(bearer(&bob))
        .to_request();
    let summary: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(summary["likes"], json!([ada_id.to_string()]));
    assert_eq!(summary["dislikes"], json!([bob_id.to_string()]));
    assert_eq!(summary["like_count"], 1);
    assert_eq!(summary["dislike_count"], 1);
    assert_eq!(summary["viewer_reaction"], "dislike");
}

#[actix_web::test]
async fn test_invalid_vote_kind_is_bad_request() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    let (_, token) = register(&app, "Ada", "ada@example.com").await;
    let post_id = create_post(&app, &token, "hello").await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/reactions"))
        .insert_header(bearer(&token))
        .set_json(json!({ "kind": "neutral" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("neutral"));

    let stored = ctx.store.load_post(post_id).await.unwrap();
    assert_eq!(stored.version, 1);
}

#[actix_web::test]
async fn test_reacting_to_missing_post_is_not_found() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    let (_, token) = register(&app, "Ada", "ada@example.com").await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/reactions", Uuid::new_v4()))
        .insert_header(bearer(&token))
        .set_json(json!({ "kind": "like" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_web::test]
async fn test_reacting_without_token_is_unauthorized() {
    let ctx = TestContext::new();
    let app = init_app(&ctx).await;
    let (_, token) = register(&app, "Ada", "ada@example.com").await;
    let post_id = create_post(&app, &token, "hello").await;

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/reactions"))
        .set_json(json!({ "kind": "like" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 401);
    let stored = ctx.store.load_post(post_id).await.unwrap();
    assert_eq!(stored.reactions.like_count(), 0);
}
