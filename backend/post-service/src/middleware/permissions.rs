/// Ownership checks for post mutation
///
/// Any authenticated user may read posts and vote on them; only the author
/// may change or delete one.
use crate::error::{AppError, Result};
use crate::models::Post;
use uuid::Uuid;

pub fn check_post_ownership(user_id: Uuid, post: &Post) -> Result<()> {
    if post.author_id == user_id {
        Ok(())
    } else {
        tracing::warn!(user_id = %user_id, post_id = %post.id, "Rejected mutation by non-owner");
        Err(AppError::Forbidden(
            "You don't have permission to modify this post".to_string(),
        ))
    }
}
