/// Auth handlers - sign-up, sign-in and the current session's user
use crate::error::{ErrorResponse, Result};
use crate::middleware::UserId;
use crate::models::{SignInRequest, SignUpRequest, User};
use crate::services::UserService;
use actix_web::{web, HttpResponse};
use crypto_core::TokenResponse;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenBody {
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

impl From<TokenResponse> for TokenBody {
    fn from(token: TokenResponse) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
        }
    }
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/sign-up",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn sign_up(
    users: web::Data<UserService>,
    payload: web::Json<SignUpRequest>,
) -> Result<HttpResponse> {
    users.sign_up(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(MessageResponse::new("user registered successfully")))
}

/// Exchange email and password for an access token
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenBody),
        (status = 400, description = "Email or password is invalid", body = ErrorResponse)
    )
)]
pub async fn sign_in(
    users: web::Data<UserService>,
    payload: web::Json<SignInRequest>,
) -> Result<HttpResponse> {
    let token = users.sign_in(&payload.email, &payload.password).await?;
    Ok(HttpResponse::Ok().json(TokenBody::from(token)))
}

/// The user the bearer token belongs to
#[utoipa::path(
    get,
    path = "/auth/current-user",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn current_user(users: web::Data<UserService>, user_id: UserId) -> Result<HttpResponse> {
    let user = users.current_user(user_id.0).await?;
    Ok(HttpResponse::Ok().json(user))
}
