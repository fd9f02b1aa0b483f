//! JWT token claims
//!
//! Bearer tokens carry the user identifier and display name.

use serde::{Deserialize, Serialize};

/// JWT claims for bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User ID
    #[serde(rename = "uid")]
    pub user_id: String,

    /// Display name at issuance
    #[serde(rename = "name", default)]
    pub display_name: String,

    // Standard JWT claims
    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Issuer
    #[serde(rename = "iss", skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl TokenClaims {
    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < chrono::Utc::now().timestamp()
    }
}

/// Extract the token from an `Authorization` header value
///
/// Accepts `Bearer <token>` (scheme case-insensitive).
pub fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
