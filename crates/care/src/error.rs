//! Care record error types

use mediguard_auth::{AuthError, ErrorKind};
use thiserror::Error;

/// Result type for care operations
pub type Result<T> = std::result::Result<T, CareError>;

/// Errors from medication, aggregation and alert operations
#[derive(Debug, Error)]
pub enum CareError {
    /// Required input missing or malformed
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(String),

    /// Identity lookup failed
    #[error(transparent)]
    Identity(#[from] AuthError),
}

impl CareError {
    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a NotFound error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Failure category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Database(_) => ErrorKind::Storage,
            Self::Identity(e) => e.kind(),
        }
    }
}

/// Reject empty or whitespace-only required input
pub(crate) fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CareError::validation(format!("{} is required", field)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            CareError::validation("meal_slot is required").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CareError::not_found("medication 'Aspirin'").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CareError::Database("locked".to_string()).kind(),
            ErrorKind::Storage
        );
        assert_eq!(
            CareError::from(AuthError::NotFound("bob".to_string())).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_require() {
        assert_eq!(require("name", " Aspirin ").unwrap(), "Aspirin");
        let err = require("name", "  ").unwrap_err();
        assert!(err.to_string().contains("name is required"));
    }
}
