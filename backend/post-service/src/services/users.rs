/// Account operations: registration, login and profile management
use super::media::{delete_quietly, MediaStore, UploadedFile};
use crate::db::{StoreError, UserStore};
use crate::error::{AppError, Result};
use crate::models::{
    NewUser, ProfileUpdate, ProfileUpdateRequest, SignUpRequest, User, UserCredentials,
};
use crypto_core::password::{hash_password, verify_password, DUMMY_PASSWORD_HASH};
use crypto_core::{JwtKeys, TokenResponse};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "email or password is invalid";

/// Trimmed, lowercased form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A miss still pays for one Argon2 verification, so response time does not
/// reveal which addresses are registered
fn hash_to_verify(credentials: Option<&UserCredentials>) -> &str {
    credentials.map_or(DUMMY_PASSWORD_HASH, |c| c.password_hash.as_str())
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    media: Arc<dyn MediaStore>,
    jwt_keys: Arc<JwtKeys>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, media: Arc<dyn MediaStore>, jwt_keys: Arc<JwtKeys>) -> Self {
        Self {
            users,
            media,
            jwt_keys,
        }
    }

    pub async fn sign_up(&self, req: SignUpRequest) -> Result<User> {
        let req = SignUpRequest {
            full_name: req.full_name.trim().to_string(),
            email: normalize_email(&req.email),
            password: req.password,
        };
        req.validate()?;

        if self.users.find_credentials_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("user already exists".to_string()));
        }

        let password = req.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))??;

        let user = self
            .users
            .create_user(NewUser {
                full_name: req.full_name,
                email: req.email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent sign-up for the same address
                StoreError::Duplicate(_) => AppError::Conflict("user already exists".to_string()),
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verify credentials and issue an access token.
    ///
    /// Unknown email and wrong password fail with the same message.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<TokenResponse> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::BadRequest("email and password are required".to_string()));
        }

        let credentials = self
            .users
            .find_credentials_by_email(&normalize_email(email))
            .await?;

        let hash = hash_to_verify(credentials.as_ref()).to_string();
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("password verification task failed: {e}")))??;

        let Some(credentials) = credentials else {
            return Err(AppError::BadRequest(INVALID_CREDENTIALS.to_string()));
        };
        if !valid {
            tracing::warn!(user_id = %credentials.user.id, "Sign-in with wrong password");
            return Err(AppError::BadRequest(INVALID_CREDENTIALS.to_string()));
        }

        let token = self
            .jwt_keys
            .issue_access_token(credentials.user.id, &credentials.user.email)?;

        tracing::info!(user_id = %credentials.user.id, "User signed in");
        Ok(token)
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.list_users().await?)
    }

    /// Change email and/or avatar. The avatar the store reports as replaced
    /// is removed from the media host once the new one is saved.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        email: Option<String>,
        avatar: Option<UploadedFile>,
    ) -> Result<User> {
        let email = email
            .map(|e| normalize_email(&e))
            .filter(|e| !e.is_empty());
        ProfileUpdateRequest {
            email: email.clone(),
        }
        .validate()?;

        let new_avatar = match avatar {
            Some(file) => Some(self.media.upload(user_id, file).await?),
            None => None,
        };

        let update = ProfileUpdate {
            email,
            avatar: new_avatar.clone(),
        };
        let updated = match self.users.update_profile(user_id, update).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(media) = &new_avatar {
                    delete_quietly(self.media.as_ref(), &media.key).await;
                }
                return Err(match e {
                    StoreError::Duplicate(_) => AppError::Conflict("email is already in use".to_string()),
                    other => other.into(),
                });
            }
        };

        if let (Some(old), Some(new)) = (&updated.previous_avatar, &new_avatar) {
            if old.key != new.key {
                delete_quietly(self.media.as_ref(), &old.key).await;
            }
        }

        tracing::info!(user_id = %user_id, "Profile updated");
        Ok(updated.user)
    }
}
