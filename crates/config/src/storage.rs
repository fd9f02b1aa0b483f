//! Storage configuration
//!
//! All state lives in a single SQLite database file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Storage configuration
///
/// # Example
///
/// ```toml
/// [storage]
/// db_path = "~/.mediguard/mediguard.db"
/// max_connections = 5
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database (`~` is expanded)
    /// Default: "data/mediguard.db"
    pub db_path: PathBuf,

    /// Connection pool size
    /// Default: 5
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/mediguard.db"),
            max_connections: 5,
        }
    }
}

impl StorageConfig {
    /// Get the database path, expanding ~ to home directory
    pub fn db_path(&self) -> PathBuf {
        expand_tilde(&self.db_path)
    }
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    path.to_str()
        .and_then(|s| s.strip_prefix("~/"))
        .and_then(|stripped| dirs::home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.db_path, PathBuf::from("data/mediguard.db"));
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_custom_path() {
        let config: StorageConfig =
            toml::from_str("db_path = \"/var/lib/mediguard/db.sqlite\"").unwrap();
        assert_eq!(
            config.db_path(),
            PathBuf::from("/var/lib/mediguard/db.sqlite")
        );
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde(&PathBuf::from("~/mediguard/db.sqlite"));
        if dirs::home_dir().is_some() {
            assert!(!expanded.to_string_lossy().starts_with('~'));
        }
    }
}
