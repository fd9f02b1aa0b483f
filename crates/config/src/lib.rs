//! MediGuard Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only the JWT secret is required.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use mediguard_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(
//!     "[auth]\njwt_secret = \"a-secret-that-is-long-enough-for-hs256\"",
//! )
//! .unwrap();
//! assert_eq!(config.server.port, 3050);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [server]
//! port = 3050
//!
//! [storage]
//! db_path = "data/mediguard.db"
//!
//! [auth]
//! jwt_secret = "your-secret-key-at-least-32-characters-long"
//! token_ttl = "1h"
//!
//! [records]
//! utc_offset = "+09:00"
//! withdrawn_data = "retain"
//!
//! [notify]
//! provider = "expo"
//! fan_out = "all_registered"
//! ```
//!
//! The `MEDIGUARD_JWT_SECRET` environment variable overrides `auth.jwt_secret`.

mod auth;
mod error;
mod logging;
mod notify;
mod records;
mod server;
mod storage;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use auth::{AuthConfig, JWT_SECRET_ENV, MIN_SECRET_LEN};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use notify::{DEFAULT_EXPO_URL, FanOut, MAX_EXPO_BATCH, NotifyConfig, NotifyProvider};
pub use records::{RecordsConfig, WithdrawnDataPolicy};
pub use server::ServerConfig;
pub use storage::StorageConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// SQLite storage configuration
    pub storage: StorageConfig,

    /// Token signing configuration
    pub auth: AuthConfig,

    /// Calendar date and withdrawn-data handling
    pub records: RecordsConfig,

    /// Push notification delivery
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration, applying overrides from `env`, then validate
    fn parse_with<F>(s: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = env(JWT_SECRET_ENV).filter(|s| !s.is_empty()) {
            self.auth.jwt_secret = Some(secret);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_with(s, |key| std::env::var(key).ok())
    }
}
