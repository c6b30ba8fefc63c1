/// In-memory store for tests and `STORE_BACKEND=memory` local runs
///
/// Each record lives in a `DashMap` shard; a version-checked save holds the
/// shard's write lock for the compare and the swap, so it is atomic just like
/// the conditional `UPDATE` of the PostgreSQL store.
use super::{PostStore, StoreError, StoreResult, UserStore};
use crate::domain::ReactionState;
use crate::models::{
    NewPost, NewUser, Post, PostView, ProfileUpdate, Role, UpdatedProfile, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredPost {
    post: Post,
    seq: u64,
}

#[derive(Debug, Clone)]
struct StoredUser {
    credentials: UserCredentials,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    posts: DashMap<Uuid, StoredPost>,
    users: DashMap<Uuid, StoredUser>,
    /// Lowercased email -> user id, the uniqueness index
    emails: DashMap<String, Uuid>,
    /// Insertion counter used to order listings newest first
    seq: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Claim `email` for `user_id`; claiming your own address again is fine
    fn claim_email(&self, email: &str, user_id: Uuid) -> StoreResult<()> {
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(entry) if *entry.get() != user_id => {
                Err(StoreError::Duplicate(format!("user with email {email}")))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(user_id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            content: Some(new_post.content),
            author_id: new_post.author_id,
            media: new_post.media,
            reactions: ReactionState::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };

        self.posts.insert(
            post.id,
            StoredPost {
                post: post.clone(),
                seq: self.next_seq(),
            },
        );

        Ok(post)
    }

    async fn load_post(&self, post_id: Uuid) -> StoreResult<Post> {
        self.posts
            .get(&post_id)
            .map(|stored| stored.post.clone())
            .ok_or_else(|| StoreError::NotFound(format!("post {post_id}")))
    }

    async fn save_post(&self, post: &Post) -> StoreResult<Post> {
        let mut stored = self
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| StoreError::NotFound(format!("post {}", post.id)))?;

        if stored.post.version != post.version {
            return Err(StoreError::VersionConflict {
                post_id: post.id,
                expected: post.version,
            });
        }

        let mut saved = post.clone();
        saved.author_id = stored.post.author_id;
        saved.created_at = stored.post.created_at;
        saved.version = stored.post.version + 1;
        saved.updated_at = Utc::now().max(stored.post.updated_at);
        stored.post = saved.clone();

        Ok(saved)
    }

    async fn list_posts(&self) -> StoreResult<Vec<PostView>> {
        let mut posts: Vec<StoredPost> = self.posts.iter().map(|e| e.value().clone()).collect();
        posts.sort_by(|a, b| b.seq.cmp(&a.seq));

        Ok(posts
            .into_iter()
            .map(|stored| {
                let author = self
                    .users
                    .get(&stored.post.author_id)
                    .map(|u| u.credentials.user.summary());
                PostView {
                    post: stored.post,
                    author,
                }
            })
            .collect())
    }

    async fn delete_post(&self, post_id: Uuid) -> StoreResult<()> {
        self.posts
            .remove(&post_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("post {post_id}")))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let id = Uuid::new_v4();
        let email = new_user.email.to_lowercase();
        self.claim_email(&email, id)?;

        let now = Utc::now();
        let user = User {
            id,
            full_name: new_user.full_name,
            email,
            role: Role::User,
            avatar: None,
            post_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.users.insert(
            id,
            StoredUser {
                credentials: UserCredentials {
                    user: user.clone(),
                    password_hash: new_user.password_hash,
                },
                seq: self.next_seq(),
            },
        );

        Ok(user)
    }

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let user_id = match self.emails.get(&email.to_lowercase()) {
            Some(id) => *id,
            None => return Ok(None),
        };

        Ok(self
            .users
            .get(&user_id)
            .map(|stored| stored.credentials.clone()))
    }

    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .get(&user_id)
            .map(|stored| stored.credentials.user.clone()))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<StoredUser> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by(|a, b| b.seq.cmp(&a.seq));

        Ok(users.into_iter().map(|s| s.credentials.user).collect())
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> StoreResult<UpdatedProfile> {
        // Holding the user's entry serializes updates of one user: the email
        // released is always the one currently stored.
        let mut stored = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
        let user = &mut stored.credentials.user;

        if let Some(email) = update.email.map(|e| e.to_lowercase()) {
            if email != user.email {
                self.claim_email(&email, user_id)?;
                self.emails.remove(&user.email);
                user.email = email;
            }
        }

        let previous_avatar = user.avatar.clone();
        if let Some(avatar) = update.avatar {
            user.avatar = Some(avatar);
        }
        user.updated_at = Utc::now().max(user.updated_at);

        Ok(UpdatedProfile {
            user: user.clone(),
            previous_avatar,
        })
    }

    async fn add_post_id(&self, user_id: Uuid, post_id: Uuid) -> StoreResult<()> {
        let mut stored = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;

        let post_ids = &mut stored.credentials.user.post_ids;
        if !post_ids.contains(&post_id) {
            post_ids.push(post_id);
        }

        Ok(())
    }

    async fn remove_post_id(&self, user_id: Uuid, post_id: Uuid) -> StoreResult<()> {
        if let Some(mut stored) = self.users.get_mut(&user_id) {
            stored.credentials.user.post_ids.retain(|id| *id != post_id);
        }

        Ok(())
    }
}
