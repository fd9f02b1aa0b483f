//! Application state
//!
//! Shared state for API handlers: the credential service and the care
//! components, both over the same database.

use std::sync::Arc;
use std::time::Instant;

use mediguard_auth::CredentialService;
use mediguard_care::Care;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and token verification
    pub credentials: Arc<CredentialService>,
    /// Medication, daily log and alert components
    pub care: Care,
    /// Server start time for uptime calculation
    pub started_at: Instant,
}

impl AppState {
    /// Create application state
    pub fn new(credentials: Arc<CredentialService>, care: Care) -> Self {
        Self {
            credentials,
            care,
            started_at: Instant::now(),
        }
    }
}
