/// Post business logic: authoring, editing and removal of posts
use super::media::{delete_quietly, MediaStore, UploadedFile};
use super::{retry_on_version_conflict, DEFAULT_MAX_ATTEMPTS};
use crate::db::{PostStore, UserStore};
use crate::error::{AppError, Result};
use crate::middleware::check_post_ownership;
use crate::models::{MediaRef, NewPost, Post, PostView, MAX_POST_CONTENT_CHARS};
use std::sync::Arc;
use uuid::Uuid;

/// Changes requested by a post edit; `None` fields are left as they are
#[derive(Debug, Default)]
pub struct PostUpdate {
    pub content: Option<String>,
    pub media: Option<UploadedFile>,
}

fn validate_content(content: &str) -> Result<String> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }
    if content.chars().count() > MAX_POST_CONTENT_CHARS {
        return Err(AppError::Validation(format!(
            "content must be at most {MAX_POST_CONTENT_CHARS} characters"
        )));
    }
    Ok(content.to_string())
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
    media: Arc<dyn MediaStore>,
    max_attempts: u32,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>, users: Arc<dyn UserStore>, media: Arc<dyn MediaStore>) -> Self {
        Self {
            posts,
            users,
            media,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn create_post(
        &self,
        author_id: Uuid,
        content: Option<String>,
        upload: Option<UploadedFile>,
    ) -> Result<Post> {
        let content = validate_content(content.as_deref().unwrap_or_default())?;

        let media = match upload {
            Some(file) => Some(self.media.upload(author_id, file).await?),
            None => None,
        };

        let new_post = NewPost {
            author_id,
            content,
            media: media.clone(),
        };
        let post = match self.posts.create_post(new_post).await {
            Ok(post) => post,
            Err(e) => {
                if let Some(media) = &media {
                    delete_quietly(self.media.as_ref(), &media.key).await;
                }
                return Err(e.into());
            }
        };

        if let Err(e) = self.users.add_post_id(author_id, post.id).await {
            tracing::warn!(user_id = %author_id, post_id = %post.id, error = %e, "Failed to link post to author");
        }

        tracing::info!(post_id = %post.id, user_id = %author_id, "Post created");
        Ok(post)
    }

    pub async fn list_posts(&self) -> Result<Vec<PostView>> {
        Ok(self.posts.list_posts().await?)
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Post> {
        Ok(self.posts.load_post(post_id).await?)
    }

    /// Round-trip to the record store
    pub async fn ping(&self) -> Result<()> {
        Ok(self.posts.ping().await?)
    }

    /// Edit a post's content and/or media. Only the author may do this.
    pub async fn update_post(&self, actor: Uuid, post_id: Uuid, update: PostUpdate) -> Result<Post> {
        let content = update.content.as_deref().map(validate_content).transpose()?;

        let current = self.posts.load_post(post_id).await?;
        check_post_ownership(actor, &current)?;

        let new_media = match update.media {
            Some(file) => Some(self.media.upload(actor, file).await?),
            None => None,
        };

        let posts = self.posts.as_ref();
        let (content_ref, media_ref) = (&content, &new_media);
        let result = retry_on_version_conflict(self.max_attempts, move || async move {
            let mut post = posts.load_post(post_id).await?;
            let previous_media = post.media.clone();

            if let Some(content) = content_ref {
                post.content = Some(content.clone());
            }
            if let Some(media) = media_ref {
                post.media = Some(media.clone());
            }

            posts
                .save_post(&post)
                .await
                .map(|saved| (saved, previous_media))
        })
        .await;

        let (saved, previous_media) = match result {
            Ok(saved) => saved,
            Err(e) => {
                if let Some(media) = &new_media {
                    delete_quietly(self.media.as_ref(), &media.key).await;
                }
                return Err(e);
            }
        };

        if let (Some(old), Some(new)) = (&previous_media, &new_media) {
            if old.key != new.key {
                delete_quietly(self.media.as_ref(), &old.key).await;
            }
        }

        tracing::info!(post_id = %post_id, user_id = %actor, version = saved.version, "Post updated");
        Ok(saved)
    }

    /// Remove a post and its media. Only the author may do this.
    pub async fn delete_post(&self, actor: Uuid, post_id: Uuid) -> Result<()> {
        let post = self.posts.load_post(post_id).await?;
        check_post_ownership(actor, &post)?;

        self.posts.delete_post(post_id).await?;

        if let Err(e) = self.users.remove_post_id(post.author_id, post_id).await {
            tracing::warn!(user_id = %post.author_id, post_id = %post_id, error = %e, "Failed to unlink post from author");
        }
        if let Some(MediaRef { key, .. }) = &post.media {
            delete_quietly(self.media.as_ref(), key).await;
        }

        tracing::info!(post_id = %post_id, user_id = %actor, "Post deleted");
        Ok(())
    }
}
