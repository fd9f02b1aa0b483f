//! Configuration validation
//!
//! Validates config consistency:
//! - A usable JWT secret is present
//! - The records offset parses
//! - Storage and notification limits are in range

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    config.auth.validate()?;
    config.records.offset()?;
    validate_storage(config)?;
    config.notify.validate()?;
    Ok(())
}

/// Validate storage settings
fn validate_storage(config: &Config) -> Result<()> {
    if config.storage.max_connections == 0 {
        return Err(ConfigError::invalid_value(
            "storage",
            "max_connections",
            "must be at least 1",
        ));
    }

    if config.storage.db_path.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("storage", "db_path"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("a-secret-that-is-long-enough-for-hs256".to_string());
        config
    }

    #[test]
    fn test_valid_minimal_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_secret() {
        let err = validate_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn test_zero_connections() {
        let mut config = valid_config();
        config.storage.max_connections = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_connections"));
    }

    #[test]
    fn test_empty_db_path() {
        let mut config = valid_config();
        config.storage.db_path = Default::default();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("db_path"));
    }

    #[test]
    fn test_bad_offset() {
        let mut config = valid_config();
        config.records.utc_offset = "9".to_string();
        assert!(validate_config(&config).is_err());
    }
}
