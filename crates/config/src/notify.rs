//! Push notification configuration
//!
//! Supports two providers:
//! - **log**: notifications are only logged (default)
//! - **expo**: notifications are delivered through the Expo push service

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Default Expo push endpoint
pub const DEFAULT_EXPO_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Expo accepts at most 100 messages per request
pub const MAX_EXPO_BATCH: usize = 100;

/// Notification delivery provider
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotifyProvider {
    /// Log notifications without delivering them
    #[default]
    Log,
    /// Deliver via the Expo push HTTP API
    Expo,
}

/// Which registered devices receive a medication confirmation
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// Every active user's registered device
    #[default]
    AllRegistered,
    /// Only the confirming user's own device
    OwnerOnly,
}

/// Push notification configuration
///
/// # Example
///
/// ```toml
/// [notify]
/// provider = "expo"
/// fan_out = "owner_only"
/// timeout = "10s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Delivery provider (log, expo)
    pub provider: NotifyProvider,

    /// Recipient selection for medication confirmations
    pub fan_out: FanOut,

    /// Expo push endpoint
    pub expo_url: String,

    /// HTTP timeout per request
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Messages per HTTP request
    pub batch_size: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            provider: NotifyProvider::Log,
            fan_out: FanOut::AllRegistered,
            expo_url: DEFAULT_EXPO_URL.to_string(),
            timeout: Duration::from_secs(10),
            batch_size: MAX_EXPO_BATCH,
        }
    }
}

impl NotifyConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.batch_size > MAX_EXPO_BATCH {
            return Err(ConfigError::invalid_value(
                "notify",
                "batch_size",
                format!("must be between 1 and {}", MAX_EXPO_BATCH),
            ));
        }
        if self.provider == NotifyProvider::Expo && !self.expo_url.starts_with("http") {
            return Err(ConfigError::invalid_value(
                "notify",
                "expo_url",
                "must be an http(s) URL",
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
        let config = NotifyConfig::default();
        assert_eq!(config.provider, NotifyProvider::Log);
        assert_eq!(config.fan_out, FanOut::AllRegistered);
        assert_eq!(config.batch_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_expo_config() {
        let toml = r#"
provider = "expo"
fan_out = "owner_only"
timeout = "3s"
batch_size = 50
"#;
        let config: NotifyConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.provider, NotifyProvider::Expo);
        assert_eq!(config.fan_out, FanOut::OwnerOnly);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.expo_url, DEFAULT_EXPO_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_size_bounds() {
        let config = NotifyConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NotifyConfig {
            batch_size: 101,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expo_url_must_be_http() {
        let config = NotifyConfig {
            provider: NotifyProvider::Expo,
            expo_url: "exp.host".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
