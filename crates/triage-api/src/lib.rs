//! Triage API crate - axum HTTP boundary over the dialogue engine.
//!
//! Exposes conversation sessions, turn submission, diagnosis and reports,
//! plus a stateless transcript scoring endpoint and a health check.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
