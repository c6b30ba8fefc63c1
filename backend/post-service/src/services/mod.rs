/// Business logic layer
pub mod media;
pub mod posts;
pub mod reactions;
pub mod users;

pub use media::{InMemoryMediaStore, MediaStore, S3MediaStore, UploadedFile};
pub use posts::PostService;
pub use reactions::ReactionService;
pub use users::UserService;

use crate::db::{PostStore, StoreError, UserStore};
use crate::error::{AppError, Result};
use crypto_core::{IdentityResolver, JwtKeys};
use std::future::Future;
use std::sync::Arc;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Everything the HTTP layer needs, wired once at startup
#[derive(Clone)]
pub struct AppServices {
    pub users: UserService,
    pub posts: PostService,
    pub reactions: ReactionService,
    pub media: Arc<dyn MediaStore>,
    pub resolver: Arc<dyn IdentityResolver>,
}

impl AppServices {
    pub fn new(
        post_store: Arc<dyn PostStore>,
        user_store: Arc<dyn UserStore>,
        media: Arc<dyn MediaStore>,
        jwt_keys: Arc<JwtKeys>,
        max_attempts: u32,
    ) -> Self {
        Self {
            users: UserService::new(user_store.clone(), media.clone(), jwt_keys.clone()),
            posts: PostService::new(post_store.clone(), user_store, media.clone())
                .with_max_attempts(max_attempts),
            reactions: ReactionService::new(post_store).with_max_attempts(max_attempts),
            media,
            resolver: jwt_keys,
        }
    }
}

/// Run a load-modify-save cycle until it lands without a version conflict.
///
/// `op` must re-read the record on every call. After `max_attempts`
/// conflicting attempts the request fails with `Conflict`.
pub(crate) async fn retry_on_version_conflict<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, StoreError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Err(StoreError::VersionConflict { post_id, expected }) if attempt < max_attempts => {
                tracing::debug!(
                    post_id = %post_id,
                    expected_version = expected,
                    attempt,
                    "Version conflict, retrying with a fresh read"
                );
                attempt += 1;
            }
            Err(StoreError::VersionConflict { post_id, .. }) => {
                tracing::warn!(post_id = %post_id, attempts = attempt, "Giving up after version conflicts");
                return Err(AppError::Conflict(format!(
                    "post {post_id} is being modified concurrently, try again"
                )));
            }
            other => return other.map_err(AppError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    fn conflict() -> StoreError {
        StoreError::VersionConflict {
            post_id: Uuid::nil(),
            expected: 1,
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_on_version_conflict(3, move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(conflict())
            } else {
                Ok("saved")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "saved");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_is_conflict() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = retry_on_version_conflict(2, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = retry_on_version_conflict(5, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::NotFound("post".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
