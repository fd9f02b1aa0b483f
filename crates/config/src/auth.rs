//! Authentication configuration
//!
//! Bearer tokens are HS256 JWTs signed with a shared secret.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Environment variable that overrides `auth.jwt_secret`
pub const JWT_SECRET_ENV: &str = "MEDIGUARD_JWT_SECRET";

/// Minimum secret length accepted for HS256 signing
pub const MIN_SECRET_LEN: usize = 32;

/// Authentication configuration
///
/// # Example
///
/// ```toml
/// [auth]
/// jwt_secret = "your-secret-key-at-least-32-characters-long"
/// token_ttl = "1h"
/// issuer = "mediguard"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT secret for signing tokens
    /// Must be at least 32 characters
    pub jwt_secret: Option<String>,

    /// Token lifetime
    /// Default: 1 hour
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,

    /// Issuer claim for tokens
    /// Default: "mediguard"
    pub issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl: Duration::from_secs(60 * 60),
            issuer: "mediguard".to_string(),
        }
    }
}

impl AuthConfig {
    /// Get the JWT secret as bytes
    pub fn jwt_secret_bytes(&self) -> Option<&[u8]> {
        self.jwt_secret.as_ref().map(|s| s.as_bytes())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let secret = self
            .jwt_secret
            .as_ref()
            .ok_or_else(|| ConfigError::missing_field("auth", "jwt_secret"))?;

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::invalid_value(
                "auth",
                "jwt_secret",
                format!("must be at least {} characters", MIN_SECRET_LEN),
            ));
        }

        if self.token_ttl.is_zero() {
            return Err(ConfigError::invalid_value(
                "auth",
                "token_ttl",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.issuer, "mediguard");
    }

    #[test]
    fn test_parse() {
        let toml = r#"
jwt_secret = "this-is-a-very-long-secret-key-for-testing"
token_ttl = "30m"
issuer = "mg-test"
"#;
        let config: AuthConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.token_ttl, Duration::from_secs(30 * 60));
        assert_eq!(config.issuer, "mg-test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_secret() {
        let err = AuthConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn test_validation_short_secret() {
        let config = AuthConfig {
            jwt_secret: Some("short".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("32 characters"));
    }

    #[test]
    fn test_validation_zero_ttl() {
        let config = AuthConfig {
            jwt_secret: Some("x".repeat(40)),
            token_ttl: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
