//! MediGuard - HTTP API
//!
//! Axum routes over the credential service and the care components.
//!
//! # Example
//!
//! ```ignore
//! use mediguard_api::{AppState, RouterOptions, build_router_with_options};
//!
//! let state = AppState::new(credentials, care);
//! let app = build_router_with_options(state, RouterOptions { trace: true, cors: true });
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, Result};
pub use extract::AuthUser;
pub use routes::{RouterOptions, build_router, build_router_with_options};
pub use state::AppState;
