//! Authentication error types

use thiserror::Error;

/// Result type for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Coarse failure categories shared by every MediGuard component
///
/// The transport layer maps each kind to one response category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input, caller must correct the request
    Validation,
    /// Uniqueness violation, e.g. duplicate account identifier
    Conflict,
    /// Bad credentials or invalid/expired token
    Auth,
    /// Referenced entity does not exist or is not active
    NotFound,
    /// Persistence layer failure, potentially transient
    Storage,
}

/// Errors that can occur during identity and credential operations
#[derive(Debug, Error)]
pub enum AuthError {
    /// Required input missing or malformed
    #[error("validation failed: {0}")]
    Validation(String),

    /// An active user already holds the identifier
    #[error("user '{0}' already exists")]
    Conflict(String),

    /// Unknown/withdrawn user or wrong password
    #[error("invalid user id or password")]
    InvalidCredentials,

    // JWT validation errors
    /// Token is missing or empty
    #[error("missing token")]
    MissingToken,

    /// JWT signature verification failed
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// Token could not be decoded or has invalid claims
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token is valid but its user has withdrawn
    #[error("user '{0}' is not active")]
    InactiveUser(String),

    /// No active user with that identifier
    #[error("user '{0}' not found")]
    NotFound(String),

    /// Database operation failed
    #[error("database error: {0}")]
    DatabaseError(String),

    /// Password hashing failed
    #[error("password hash error: {0}")]
    PasswordHash(String),

    /// Service constructed with unusable settings
    #[error("invalid auth configuration: {0}")]
    Config(String),
}

impl AuthError {
    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Failure category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidCredentials
            | Self::MissingToken
            | Self::InvalidSignature
            | Self::TokenExpired
            | Self::InvalidToken(_)
            | Self::InactiveUser(_) => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DatabaseError(_) | Self::PasswordHash(_) | Self::Config(_) => {
                ErrorKind::Storage
            }
        }
    }
}
