/// Concurrent votes against one post must all land
use futures::future::join_all;
use post_service::db::{InMemoryStore, PostStore};
use post_service::models::NewPost;
use post_service::services::ReactionService;
use std::sync::Arc;
use uuid::Uuid;

async fn seeded() -> (Arc<InMemoryStore>, Uuid) {
    let store = Arc::new(InMemoryStore::new());
    let post = store
        .create_post(NewPost {
            author_id: Uuid::new_v4(),
            content: "popular".to_string(),
            media: None,
        })
        .await
        .unwrap();
    (store, post.id)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_from_distinct_users_all_land() {
    let (store, post_id) = seeded().await;
    // Enough attempts that contention never exhausts them
    let service = ReactionService::new(store.clone()).with_max_attempts(1_000);
    let users: Vec<Uuid> = (0..32).map(|_| Uuid::new_v4()).collect();

    let tasks = users.iter().map(|user_id| {
        let service = service.clone();
        let user_id = *user_id;
        tokio::spawn(async move { service.react(post_id, user_id, "like").await })
    });

    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let post = store.load_post(post_id).await.unwrap();
    assert_eq!(post.reactions.like_count(), users.len());
    for user_id in &users {
        assert!(post.reactions.likes().contains(user_id));
    }
    assert_eq!(post.version, 1 + users.len() as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_toggles_by_one_user_stay_consistent() {
    let (store, post_id) = seeded().await;
    let service = ReactionService::new(store.clone()).with_max_attempts(1_000);
    let user_id = Uuid::new_v4();

    // An even number of identical likes must leave no vote behind
    let tasks = (0..10).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.react(post_id, user_id, "like").await })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let post = store.load_post(post_id).await.unwrap();
    assert_eq!(post.reactions.reaction_of(user_id), None);
    assert_eq!(post.version, 11);
}
