use super::{is_unique_violation, StoreError, StoreResult, UserStore};
use crate::models::{MediaRef, NewUser, ProfileUpdate, Role, UpdatedProfile, User, UserCredentials};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, full_name, email, role, avatar_key, avatar_url, post_ids, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    full_name: String,
    email: String,
    role: String,
    avatar_key: Option<String>,
    avatar_url: Option<String>,
    post_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UpdatedProfileRow {
    #[sqlx(flatten)]
    user: UserRow,
    previous_avatar_key: Option<String>,
    previous_avatar_url: Option<String>,
}

fn media_ref(key: Option<String>, url: Option<String>) -> Option<MediaRef> {
    match (key, url) {
        (Some(key), Some(url)) => Some(MediaRef { key, url }),
        _ => None,
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("user {}: {e}", row.id)))?;

        let avatar = media_ref(row.avatar_key, row.avatar_url);

        Ok(User {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            role,
            avatar,
            post_ids: row.post_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn email_taken(err: sqlx::Error, email: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Duplicate(format!("user with email {email}"))
    } else {
        StoreError::Database(err)
    }
}

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (full_name, email, password_hash)
            VALUES ($1, LOWER($2), $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.full_name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| email_taken(e, &new_user.email))?;

        User::try_from(row)
    }

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(UserCredentials {
                user: User::try_from(row.user)?,
                password_hash: row.password_hash,
            })
        })
        .transpose()
    }

    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> StoreResult<UpdatedProfile> {
        let (avatar_key, avatar_url) = match &update.avatar {
            Some(m) => (Some(m.key.as_str()), Some(m.url.as_str())),
            None => (None, None),
        };
        let email = update.email.clone().unwrap_or_default();

        // The row lock makes concurrent updates of one user queue up, and each
        // sees the avatar the previous one wrote.
        let row = sqlx::query_as::<_, UpdatedProfileRow>(
            r#"
            WITH previous AS (
                SELECT id, avatar_key, avatar_url FROM users WHERE id = $1 FOR UPDATE
            )
            UPDATE users AS u
            SET email = COALESCE(LOWER($2), u.email),
                avatar_key = COALESCE($3, u.avatar_key),
                avatar_url = COALESCE($4, u.avatar_url),
                updated_at = NOW()
            FROM previous
            WHERE u.id = previous.id
            RETURNING u.id, u.full_name, u.email, u.role, u.avatar_key, u.avatar_url,
                      u.post_ids, u.created_at, u.updated_at,
                      previous.avatar_key AS previous_avatar_key,
                      previous.avatar_url AS previous_avatar_url
            "#,
        )
        .bind(user_id)
        .bind(update.email.as_deref())
        .bind(avatar_key)
        .bind(avatar_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| email_taken(e, &email))?
        .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;

        Ok(UpdatedProfile {
            previous_avatar: media_ref(row.previous_avatar_key, row.previous_avatar_url),
            user: User::try_from(row.user)?,
        })
    }

    async fn add_post_id(&self, user_id: Uuid, post_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET post_ids = array_append(array_remove(post_ids, $2), $2)
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }

        Ok(())
    }

    async fn remove_post_id(&self, user_id: Uuid, post_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE users SET post_ids = array_remove(post_ids, $2) WHERE id = $1")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
