//! MediGuard - medication adherence and health alert backend
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! mediguard
//! mediguard --config configs/mediguard.toml
//!
//! # Validate a configuration file
//! mediguard check-config --config configs/mediguard.toml
//! ```

mod cmd;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mediguard_config::{Config, LogConfig, LogFormat};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// MediGuard - medication adherence and health alert backend
#[derive(Parser, Debug)]
#[command(name = "mediguard")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the API server
    Serve,

    /// Validate a configuration file and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::CheckConfig) => {
            // Check doesn't need logging - just outputs to stdout
            cmd::check_config::run(cli.config.as_deref())
        }
        // No subcommand = run server (default behavior)
        Some(Command::Serve) | None => {
            let log = load_log_config(cli.config.as_deref());
            let level = resolve_log_level(cli.log_level.as_deref(), &log);
            init_logging(&level, &log)?;
            cmd::serve::run(cli.config).await
        }
    }
}

/// Logging section of the config file, or defaults if it cannot be read
///
/// Configuration errors are reported properly once the server loads it.
fn load_log_config(config_path: Option<&Path>) -> LogConfig {
    config_path
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(path).ok())
        .map(|config| config.log)
        .unwrap_or_default()
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, log: &LogConfig) -> String {
    match cli_level {
        Some(level) => level.to_string(),
        None => log.level.as_str().to_string(),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, log: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(log.filter_directives(level))
        .or_else(|_| EnvFilter::try_new(log.filter_directives("info")))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let writer = if log.stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Console => registry
            .with(fmt::layer().with_target(true).with_writer(writer))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_writer(writer))
            .init(),
    }

    Ok(())
}
