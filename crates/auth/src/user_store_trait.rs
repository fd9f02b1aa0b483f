//! User store trait for abstracting storage backends
//!
//! `CredentialService` works against this trait; `LocalUserStore` is the
//! SQLite implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::user::{NewUser, StoredUser};

/// Abstract user store operations
#[async_trait]
pub trait UserStore: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Create a user, or revive a withdrawn user with the same id
    ///
    /// Fails with `AuthError::Conflict` if an active user holds the id.
    async fn create_user(&self, user: &NewUser, password_hash: &str) -> Result<StoredUser>;

    /// Get an active user by ID
    async fn get_active(&self, user_id: &str) -> Result<Option<StoredUser>>;

    /// Get a user by ID regardless of soft-delete state
    async fn get_by_id(&self, user_id: &str) -> Result<Option<StoredUser>>;

    /// Record the first successful login; false if already recorded
    async fn mark_first_login(&self, user_id: &str) -> Result<bool>;

    /// Soft-delete an active user inside a transaction
    ///
    /// Returns false when no active user matched.
    async fn withdraw(&self, user_id: &str) -> Result<bool>;

    /// Update the elderly-role flag of an active user
    async fn set_role(&self, user_id: &str, is_elderly: bool) -> Result<bool>;

    // =========================================================================
    // Push Tokens
    // =========================================================================

    /// Store or replace an active user's push token
    async fn set_push_token(&self, user_id: &str, token: &str) -> Result<bool>;

    /// Push tokens of every active user
    async fn active_push_tokens(&self) -> Result<Vec<String>>;
}
