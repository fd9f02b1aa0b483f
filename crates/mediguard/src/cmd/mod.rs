//! Command implementations for the MediGuard CLI

pub mod check_config;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mediguard_config::{Config, JWT_SECRET_ENV};
use tracing::info;

/// Paths tried when no `--config` is given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/mediguard.toml", "mediguard.toml"];

/// Load configuration from an explicit path, a default path, or the environment
///
/// An explicit path must exist. Without any file the defaults apply and the
/// JWT secret must come from the environment.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "config file not found: {}",
                path.display()
            ));
        }
        return Config::from_file(path).context("failed to load configuration");
    }

    for candidate in DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from) {
        if candidate.exists() {
            info!(config = %candidate.display(), "using config file");
            return Config::from_file(&candidate).context("failed to load configuration");
        }
    }

    info!("no config file found, using defaults");
    ""
        .parse::<Config>()
        .with_context(|| format!("no config file found and {} is not usable", JWT_SECRET_ENV))
}
