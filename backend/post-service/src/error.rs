/// Error types for post-service
///
/// Every failure reaching a handler is an [`AppError`]; it renders as
/// `{"error": <message>, "status": <code>}`.
use crate::db::StoreError;
use crate::domain::ReactionError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::password::PasswordError;
use crypto_core::{AuthError, JwtError};
use s3_utils::S3Error;
use serde::Serialize;
use utoipa::ToSchema;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidVoteKind(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Media host error: {0}")]
    Media(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidVoteKind(_) | AppError::Validation(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Media(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Server-side details stay in the logs
        let error = match self {
            AppError::Database(msg) | AppError::Internal(msg) => {
                tracing::error!(error = %msg, status = status.as_u16(), "Request failed");
                "Internal server error".to_string()
            }
            AppError::Media(msg) => {
                tracing::error!(error = %msg, status = status.as_u16(), "Media host request failed");
                "Media host unavailable".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error,
            status: status.as_u16(),
        })
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            StoreError::Duplicate(what) => AppError::Conflict(format!("{what} already exists")),
            StoreError::VersionConflict { .. } => AppError::Conflict(err.to_string()),
            StoreError::Corrupt(msg) => AppError::Internal(msg),
            StoreError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<ReactionError> for AppError {
    fn from(err: ReactionError) -> Self {
        match err {
            ReactionError::InvalidVoteKind(_) => AppError::InvalidVoteKind(err.to_string()),
            ReactionError::ConflictingMembership(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        AppError::Internal(format!("token issuance failed: {err}"))
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<S3Error> for AppError {
    fn from(err: S3Error) -> Self {
        AppError::Media(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Unauthorized("x".into()), 401),
            (AppError::Forbidden("x".into()), 403),
            (AppError::InvalidVoteKind("x".into()), 400),
            (AppError::Validation("x".into()), 400),
            (AppError::NotFound("x".into()), 404),
            (AppError::Conflict("x".into()), 409),
            (AppError::PayloadTooLarge("x".into()), 413),
            (AppError::Database("x".into()), 500),
            (AppError::Media("x".into()), 502),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
        }
    }

    #[test]
    fn test_store_errors_map_to_http_semantics() {
        let not_found: AppError = StoreError::NotFound(format!("post {}", Uuid::nil())).into();
        assert!(matches!(not_found, AppError::NotFound(_)));

        let conflict: AppError = StoreError::VersionConflict {
            post_id: Uuid::nil(),
            expected: 3,
        }
        .into();
        assert!(matches!(conflict, AppError::Conflict(_)));

        let duplicate: AppError = StoreError::Duplicate("user".into()).into();
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_vote_kind_maps_to_bad_request() {
        let err: AppError = ReactionError::InvalidVoteKind("neutral".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("neutral"));
    }

    #[actix_web::test]
    async fn test_internal_details_are_not_leaked() {
        let resp = AppError::Database("connection refused on 10.0.0.5".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(json["status"], 500);
    }
}
