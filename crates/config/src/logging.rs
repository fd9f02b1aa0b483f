//! Logging configuration
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "json"
//! stderr = false
//! quiet_dependencies = true
//! ```

use serde::Deserialize;

/// Targets whose per-statement and per-connection chatter is capped at `warn`
const NOISY_TARGETS: [&str; 3] = ["sqlx", "hyper", "reqwest"];

/// Minimum level for MediGuard's own events
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Console lines for operators, JSON lines for log shippers
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

/// `[log]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Write to stderr instead of stdout
    pub stderr: bool,
    /// Cap database, HTTP and push client logs at `warn`
    pub quiet_dependencies: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            stderr: false,
            quiet_dependencies: true,
        }
    }
}

impl LogConfig {
    /// `EnvFilter` directives for `level`
    ///
    /// `level` comes from the command line or [`LogConfig::level`]. Dependency
    /// caps are appended only when they are stricter than `level`.
    pub fn filter_directives(&self, level: &str) -> String {
        let mut directives = level.to_string();
        if self.quiet_dependencies && !matches!(level, "warn" | "error" | "off") {
            for target in NOISY_TARGETS {
                directives.push_str(&format!(",{}=warn", target));
            }
        }
        directives
    }
}
