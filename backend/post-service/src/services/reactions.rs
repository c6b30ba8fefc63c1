/// Like/dislike voting on posts
use super::{retry_on_version_conflict, DEFAULT_MAX_ATTEMPTS};
use crate::db::PostStore;
use crate::domain::{ReactionSummary, VoteKind};
use crate::error::Result;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ReactionService {
    posts: Arc<dyn PostStore>,
    max_attempts: u32,
}

impl ReactionService {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        Self {
            posts,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Record `user_id`'s `vote_kind` on a post and return the new state.
    ///
    /// The kind is checked before the store is touched. Each attempt reads
    /// the post fresh and saves against the version it read, so concurrent
    /// votes never overwrite each other.
    pub async fn react(&self, post_id: Uuid, user_id: Uuid, vote_kind: &str) -> Result<ReactionSummary> {
        let kind: VoteKind = vote_kind.parse()?;
        let posts = self.posts.as_ref();

        let saved = retry_on_version_conflict(self.max_attempts, move || async move {
            let mut post = posts.load_post(post_id).await?;
            post.reactions = post.reactions.apply(user_id, kind);
            posts.save_post(&post).await
        })
        .await?;

        tracing::info!(
            post_id = %post_id,
            user_id = %user_id,
            kind = %kind,
            reaction = ?saved.reactions.reaction_of(user_id),
            version = saved.version,
            "Reaction applied"
        );

        Ok(ReactionSummary::for_viewer(post_id, &saved.reactions, user_id))
    }

    /// Current reactions on a post as seen by `viewer`
    pub async fn summary(&self, post_id: Uuid, viewer: Uuid) -> Result<ReactionSummary> {
        let post = self.posts.load_post(post_id).await?;
        Ok(ReactionSummary::for_viewer(post_id, &post.reactions, viewer))
    }
}
