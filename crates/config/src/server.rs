//! HTTP server configuration

use serde::Deserialize;

/// HTTP server configuration
///
/// # Example
///
/// ```toml
/// [server]
/// host = "0.0.0.0"    # default
/// port = 3050         # default
/// cors = true         # default
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    /// Default: "0.0.0.0"
    pub host: String,

    /// Port to listen on
    /// Default: 3050
    pub port: u16,

    /// Allow cross-origin requests from any origin (mobile dev builds)
    /// Default: true
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3050,
            cors: true,
        }
    }
}

impl ServerConfig {
    /// Socket address string (`host:port`)
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
