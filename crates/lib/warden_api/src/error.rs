//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use warden_core::auth::AuthError;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// The single message used for every token failure.
    pub fn invalid_token() -> Self {
        AppError::Unauthorized(AuthError::TokenInvalid.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", m.as_str())
            }
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Unavailable(detail) => {
                error!(detail = %detail, "user store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "Service temporarily unavailable",
                )
            }
            AppError::Internal(detail) => {
                error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => AppError::Validation(msg),
            e @ AuthError::UserAlreadyExists(_) => AppError::Conflict(e.to_string()),
            e @ (AuthError::InvalidCredentials | AuthError::TokenInvalid) => {
                AppError::Unauthorized(e.to_string())
            }
            AuthError::StoreUnavailable(msg) => AppError::Unavailable(msg),
            AuthError::Config(msg) | AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_statuses() {
        let cases = [
            (AuthError::Validation("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AuthError::UserAlreadyExists("alice".into()), StatusCode::CONFLICT),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::TokenInvalid, StatusCode::UNAUTHORIZED),
            (AuthError::StoreUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AuthError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::Config("short".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let label = format!("{err:?}");
            assert_eq!(AppError::from(err).into_response().status(), status, "{label}");
        }
    }

    #[tokio::test]
    async fn opaque_variants_hide_detail() {
        for err in [
            AuthError::StoreUnavailable("connection refused to 10.0.0.5".into()),
            AuthError::Internal("bcrypt hash: boom".into()),
        ] {
            let resp = AppError::from(err).into_response();
            let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
            assert!(!body.message.contains("10.0.0.5"));
            assert!(!body.message.contains("bcrypt"));
        }
    }
}
