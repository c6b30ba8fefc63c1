/// Record store abstractions and their PostgreSQL / in-memory backends
pub mod memory;
pub mod post_repo;
pub mod user_repo;

pub use memory::InMemoryStore;
pub use post_repo::PgPostStore;
pub use user_repo::PgUserStore;

use crate::models::{
    NewPost, NewUser, Post, PostView, ProfileUpdate, UpdatedProfile, User, UserCredentials,
};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("post {post_id} was modified concurrently (expected version {expected})")]
    VersionConflict { post_id: Uuid, expected: i64 },

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post>;

    async fn load_post(&self, post_id: Uuid) -> StoreResult<Post>;

    /// Write the whole record if the stored version still equals
    /// `post.version`, returning the saved record with the bumped version.
    async fn save_post(&self, post: &Post) -> StoreResult<Post>;

    /// All posts, newest first, with their authors
    async fn list_posts(&self) -> StoreResult<Vec<PostView>>;

    async fn delete_post(&self, post_id: Uuid) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate` if the (lowercased) email is taken
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>>;

    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    /// All users, newest first
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Apply `update` and report the avatar stored just before it. Concurrent
    /// updates of one user serialize, so each replaced avatar is reported once.
    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> StoreResult<UpdatedProfile>;

    async fn add_post_id(&self, user_id: Uuid, post_id: Uuid) -> StoreResult<()>;

    async fn remove_post_id(&self, user_id: Uuid, post_id: Uuid) -> StoreResult<()>;
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
