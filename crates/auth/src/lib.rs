//! MediGuard - Identity
//!
//! User identity store and credential service.
//!
//! # Overview
//!
//! - [`LocalUserStore`] keeps user records in SQLite. Users are soft-deleted
//!   by flipping a `delyn` flag and are never physically removed.
//! - [`CredentialService`] registers accounts (password policy + Argon2id),
//!   authenticates logins, issues and verifies HS256 bearer tokens and
//!   withdraws users.
//!
//! Every protected operation in the other crates runs only after
//! [`CredentialService::verify`] has resolved the caller.
//!
//! # Tokens
//!
//! ```text
//! eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...
//! ```
//! - Carries user id (`uid`) and display name (`name`)
//! - Expires one hour after issuance by default

mod claims;
pub mod db;
mod error;
pub mod password;
mod service;
mod user;
mod user_store;
mod user_store_trait;

/// Test utilities for generating identities and JWT tokens
pub mod test_utils;

pub use claims::{TokenClaims, extract_bearer};
pub use error::{AuthError, ErrorKind, Result};
pub use user::{NewUser, Sex, StoredUser, UserInfo};

// Local user store
pub use user_store::LocalUserStore;
pub use user_store_trait::UserStore;

// Credential service
pub use service::{AuthResponse, CredentialConfig, CredentialService};
