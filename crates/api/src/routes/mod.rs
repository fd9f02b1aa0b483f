//! API routes
//!
//! Domain-grouped HTTP route handlers.

pub mod calendar;
pub mod health;
pub mod medication;
pub mod ops;
pub mod users;

use axum::Router;
use chrono::NaiveDate;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Options for building the router
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Log every request through `TraceLayer`
    pub trace: bool,
    /// Allow cross-origin requests from any origin
    pub cors: bool,
}

/// Build the complete API router
pub fn build_router(state: AppState) -> Router {
    build_router_with_options(state, RouterOptions::default())
}

/// Build the complete API router with options
pub fn build_router_with_options(state: AppState, options: RouterOptions) -> Router {
    let mut router = Router::new()
        // Operations routes (health - no auth)
        .merge(ops::routes())
        // Accounts (signup/login/check-id/logout public, rest protected)
        .nest("/api/users", users::routes())
        // Protected care routes
        .nest("/api/medication", medication::routes())
        .nest("/api/health", health::routes())
        .nest("/api/calendar", calendar::routes());

    if options.cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }
    if options.trace {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

/// Parse a required `YYYY-MM-DD` field
pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ApiError::validation(format!("{} must be YYYY-MM-DD, got '{}'", field, value))
    })
}
