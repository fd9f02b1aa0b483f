//! User records
//!
//! `NewUser` is the registration candidate, `StoredUser` the persisted row
//! and `UserInfo` the identity resolved from a bearer token.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Sex flag on the user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    /// Male
    Male,
    /// Female
    Female,
}

impl Sex {
    /// Convert to the stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Parse from the stored string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Registration candidate
///
/// Every field except `is_elderly` is required. Absent fields deserialize
/// to empty values and are rejected by [`NewUser::validate`].
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    /// Unique, immutable identifier
    pub user_id: String,
    /// Proposed plaintext password
    pub password: String,
    /// Name shown to caregivers
    pub display_name: String,
    /// Guardian contact (email)
    pub guardian_contact: String,
    /// Birth date as `YYYYMMDD`
    pub birth_date: String,
    /// Birth date is on the lunar calendar
    pub lunar_birth: Option<bool>,
    /// Sex flag
    pub sex: Option<Sex>,
    /// Elderly-role flag
    pub is_elderly: bool,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .field("is_elderly", &self.is_elderly)
            .finish_non_exhaustive()
    }
}

impl NewUser {
    /// Check that all required profile fields are present and well formed
    ///
    /// The password policy is checked separately.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("user_id", &self.user_id),
            ("password", &self.password),
            ("display_name", &self.display_name),
            ("guardian_contact", &self.guardian_contact),
            ("birth_date", &self.birth_date),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AuthError::validation(format!("{} is required", field)));
            }
        }
        if self.user_id.chars().any(char::is_whitespace) {
            return Err(AuthError::validation("user_id must not contain whitespace"));
        }
        if self.lunar_birth.is_none() {
            return Err(AuthError::validation("lunar_birth is required"));
        }
        if self.sex.is_none() {
            return Err(AuthError::validation("sex is required"));
        }
        if self.birth_date.len() != 8
            || NaiveDate::parse_from_str(&self.birth_date, "%Y%m%d").is_err()
        {
            return Err(AuthError::validation("birth_date must be YYYYMMDD"));
        }
        Ok(())
    }
}

/// Stored user record
#[derive(Debug, Clone)]
pub struct StoredUser {
    /// User ID (primary key)
    pub user_id: String,
    /// Argon2 password hash
    pub password_hash: String,
    /// Display name
    pub display_name: String,
    /// Guardian contact
    pub guardian_contact: String,
    /// Birth date (`YYYYMMDD`)
    pub birth_date: String,
    /// Lunar-calendar birth date
    pub lunar_birth: bool,
    /// Sex flag
    pub sex: Sex,
    /// Elderly-role flag
    pub is_elderly: bool,
    /// Soft-delete flag is `N`
    pub active: bool,
    /// Whether the user has logged in at least once
    pub first_login: bool,
    /// Registered push-notification token
    pub push_token: Option<String>,
    /// When the user was created
    pub created_at: DateTime<Utc>,
    /// Last profile change
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    /// Convert to UserInfo (for API responses)
    pub fn to_user_info(&self) -> UserInfo {
        UserInfo::new(&self.user_id, &self.display_name)
    }
}

/// Authenticated user identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User ID
    pub user_id: String,
    /// Display name
    pub display_name: String,
}

impl UserInfo {
    /// Create a user identity
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}
