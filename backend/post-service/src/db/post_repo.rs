use super::{PostStore, StoreError, StoreResult};
use crate::domain::ReactionState;
use crate::models::{AuthorSummary, MediaRef, NewPost, Post, PostView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const POST_COLUMNS: &str = "p.id, p.author_id, p.content, p.media_key, p.media_url, \
     p.likes, p.dislikes, p.version, p.created_at, p.updated_at";

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    content: Option<String>,
    media_key: Option<String>,
    media_url: Option<String>,
    likes: Vec<Uuid>,
    dislikes: Vec<Uuid>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct PostViewRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_full_name: Option<String>,
    author_email: Option<String>,
}

impl TryFrom<PostRow> for Post {
    type Error = StoreError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let reactions = ReactionState::from_parts(row.likes, row.dislikes)
            .map_err(|e| StoreError::Corrupt(format!("post {}: {e}", row.id)))?;

        let media = match (row.media_key, row.media_url) {
            (Some(key), Some(url)) => Some(MediaRef { key, url }),
            _ => None,
        };

        Ok(Post {
            id: row.id,
            content: row.content,
            author_id: row.author_id,
            media,
            reactions,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<PostViewRow> for PostView {
    type Error = StoreError;

    fn try_from(row: PostViewRow) -> Result<Self, Self::Error> {
        let author_id = row.post.author_id;
        let author = match (row.author_full_name, row.author_email) {
            (Some(full_name), Some(email)) => Some(AuthorSummary {
                id: author_id,
                full_name,
                email,
            }),
            _ => None,
        };

        Ok(PostView {
            post: Post::try_from(row.post)?,
            author,
        })
    }
}

/// PostgreSQL-backed post store
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, post_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}

fn media_columns(media: &Option<MediaRef>) -> (Option<&str>, Option<&str>) {
    match media {
        Some(m) => (Some(m.key.as_str()), Some(m.url.as_str())),
        None => (None, None),
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post> {
        let (media_key, media_url) = media_columns(&new_post.media);

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts AS p (author_id, content, media_key, media_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(new_post.author_id)
        .bind(&new_post.content)
        .bind(media_key)
        .bind(media_url)
        .fetch_one(&self.pool)
        .await?;

        Post::try_from(row)
    }

    async fn load_post(&self, post_id: Uuid) -> StoreResult<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1"
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("post {post_id}")))?;

        Post::try_from(row)
    }

    async fn save_post(&self, post: &Post) -> StoreResult<Post> {
        let (media_key, media_url) = media_columns(&post.media);
        let likes: Vec<Uuid> = post.reactions.likes().iter().copied().collect();
        let dislikes: Vec<Uuid> = post.reactions.dislikes().iter().copied().collect();

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts AS p
            SET content = $3,
                media_key = $4,
                media_url = $5,
                likes = $6,
                dislikes = $7,
                version = p.version + 1,
                updated_at = GREATEST(NOW(), p.updated_at)
            WHERE p.id = $1 AND p.version = $2
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(post.version)
        .bind(&post.content)
        .bind(media_key)
        .bind(media_url)
        .bind(&likes)
        .bind(&dislikes)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Post::try_from(row),
            None if self.exists(post.id).await? => Err(StoreError::VersionConflict {
                post_id: post.id,
                expected: post.version,
            }),
            None => Err(StoreError::NotFound(format!("post {}", post.id))),
        }
    }

    async fn list_posts(&self) -> StoreResult<Vec<PostView>> {
        let rows = sqlx::query_as::<_, PostViewRow>(&format!(
            r#"
            SELECT {POST_COLUMNS},
                   u.full_name AS author_full_name,
                   u.email AS author_email
            FROM posts p
            LEFT JOIN users u ON u.id = p.author_id
            ORDER BY p.created_at DESC, p.id DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PostView::try_from).collect()
    }

    async fn delete_post(&self, post_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("post {post_id}")));
        }

        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
