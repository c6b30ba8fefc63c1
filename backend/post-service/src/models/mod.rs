/// Data models for post-service
use crate::domain::ReactionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const MAX_POST_CONTENT_CHARS: usize = 5000;

/// Reference to an object on the media host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MediaRef {
    /// Object key, used to delete the object later
    pub key: String,
    /// Public URL the object is served from
    pub url: String,
}

/// Post entity
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Post {
    pub id: Uuid,
    pub content: Option<String>,
    pub author_id: Uuid,
    pub media: Option<MediaRef>,
    pub reactions: ReactionState,
    /// Optimistic-lock version, bumped by every successful save
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub content: String,
    pub media: Option<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

/// Post with its author embedded, as returned by the feed listing
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    /// `null` if the author account no longer exists
    pub author: Option<AuthorSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Public view of a user. Credentials live in [`UserCredentials`] only.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<MediaRef>,
    /// Ids of posts this user authored. Advisory; ownership is `Post::author_id`.
    pub post_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
}

/// Fields to change on a profile; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub avatar: Option<MediaRef>,
}

/// Result of a profile update: the saved user and the avatar it had just
/// before the write, read in the same atomic step
#[derive(Debug, Clone)]
pub struct UpdatedProfile {
    pub user: User,
    pub previous_avatar: Option<MediaRef>,
}

// ============================================================================
// Request payloads
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    #[serde(alias = "fullName")]
    #[validate(length(min = 1, max = 100, message = "full name must be 1-100 characters"))]
    pub full_name: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6-128 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(email(message = "email is invalid"))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReactionRequest {
    /// `like` or `dislike`
    #[schema(example = "like")]
    pub kind: String,
}
