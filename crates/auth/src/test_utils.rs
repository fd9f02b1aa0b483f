//! Test utilities for identities and JWT tokens
//!
//! These helpers create valid signed JWTs and registration candidates.
//! Use these instead of mocking - they test the real validation code path.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::claims::TokenClaims;
use crate::service::{CredentialConfig, CredentialService};
use crate::user::{NewUser, Sex};
use crate::user_store::LocalUserStore;

/// Test secret for JWT signing (32 bytes for HS256)
pub const TEST_SECRET: &[u8] = b"test-secret-key-32-bytes-long!!!";

/// Password used by [`test_candidate`]
pub const TEST_PASSWORD: &str = "Secret1!";

/// A valid registration candidate for `user_id`
///
/// The display name is the id with its first letter capitalised.
pub fn test_candidate(user_id: &str) -> NewUser {
    let mut chars = user_id.chars();
    let display_name = chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default();

    NewUser {
        user_id: user_id.to_string(),
        password: TEST_PASSWORD.to_string(),
        display_name,
        guardian_contact: format!("guardian+{}@example.com", user_id),
        birth_date: "19450815".to_string(),
        lunar_birth: Some(false),
        sex: Some(Sex::Female),
        is_elderly: true,
    }
}

/// Credential service over an existing store, signing with [`TEST_SECRET`]
pub fn test_service(store: LocalUserStore) -> CredentialService {
    CredentialService::new(Arc::new(store), CredentialConfig::new(TEST_SECRET.to_vec()))
        .expect("test secret is long enough")
}

/// Create a test token with default settings
///
/// # Example
///
/// ```
/// use mediguard_auth::test_utils::create_test_token;
///
/// let token = create_test_token("alice", "Alice");
/// assert_eq!(token.split('.').count(), 3);
/// ```
pub fn create_test_token(user_id: &str, display_name: &str) -> String {
    create_test_token_with_options(
        user_id,
        display_name,
        Some("mediguard"),
        TEST_SECRET,
        Duration::hours(1),
    )
}

/// Create a test token with full control over all options
pub fn create_test_token_with_options(
    user_id: &str,
    display_name: &str,
    issuer: Option<&str>,
    secret: &[u8],
    expires_in: Duration,
) -> String {
    let now = Utc::now();

    let claims = TokenClaims {
        user_id: user_id.to_string(),
        display_name: display_name.to_string(),
        expires_at: (now + expires_in).timestamp(),
        issued_at: now.timestamp(),
        issuer: issuer.map(String::from),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .expect("failed to encode test JWT")
}
