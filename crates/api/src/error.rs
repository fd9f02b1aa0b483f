//! API error types
//!
//! Every failure leaves the API as `{ "error": CODE, "message": .. }`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mediguard_auth::{AuthError, ErrorKind};
use mediguard_care::CareError;
use serde::Serialize;
use thiserror::Error;

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body or query could not be decoded
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or malformed field
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired credentials
    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Resource already exists
    #[error("{0}")]
    Conflict(String),

    /// Storage or other internal failure
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized { code, .. } => *code,
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    // Helper constructors

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Storage => Self::Internal(message),
            ErrorKind::Auth => {
                let code = match err {
                    AuthError::MissingToken => "AUTH_REQUIRED",
                    AuthError::TokenExpired => "TOKEN_EXPIRED",
                    AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
                    AuthError::InactiveUser(_) => "INACTIVE_USER",
                    _ => "INVALID_TOKEN",
                };
                Self::Unauthorized { code, message }
            }
        }
    }
}

impl From<CareError> for ApiError {
    fn from(err: CareError) -> Self {
        match err {
            CareError::Identity(inner) => inner.into(),
            CareError::Validation(_) => Self::Validation(err.to_string()),
            CareError::NotFound(_) => Self::NotFound(err.to_string()),
            CareError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub error: &'static str,
    /// Error message (human-readable)
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(
                error_code = body.error,
                error_message = %body.message,
                status = %status,
                "API error"
            );
        } else {
            tracing::warn!(
                error_code = body.error,
                error_message = %body.message,
                status = %status,
                "API error"
            );
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
