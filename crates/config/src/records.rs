//! Health record configuration
//!
//! Controls how calendar dates are derived and how records of withdrawn
//! users are treated by read projections.

use chrono::FixedOffset;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Visibility of records owned by withdrawn users
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawnDataPolicy {
    /// Reads ignore the owner's active flag (default)
    #[default]
    Retain,
    /// Reads treat rows of withdrawn owners as absent
    Hide,
}

impl WithdrawnDataPolicy {
    /// Whether reads must filter out withdrawn owners
    pub fn hides_withdrawn(&self) -> bool {
        matches!(self, Self::Hide)
    }
}

/// Health record configuration
///
/// # Example
///
/// ```toml
/// [records]
/// utc_offset = "+09:00"
/// withdrawn_data = "retain"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// UTC offset used to derive "today" and alert dates (`+HH:MM`)
    /// Default: "+09:00"
    pub utc_offset: String,

    /// How reads treat rows owned by withdrawn users
    /// Default: retain
    pub withdrawn_data: WithdrawnDataPolicy,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            utc_offset: "+09:00".to_string(),
            withdrawn_data: WithdrawnDataPolicy::Retain,
        }
    }
}

impl RecordsConfig {
    /// Parse the configured offset
    pub fn offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.utc_offset).ok_or_else(|| {
            ConfigError::invalid_value(
                "records",
                "utc_offset",
                format!("'{}' is not of the form +HH:MM", self.utc_offset),
            )
        })
    }
}

/// Parse `+HH:MM` / `-HH:MM` into a fixed offset
fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
