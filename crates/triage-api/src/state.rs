//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use triage_core::config::TriageConfig;
use triage_dialog::TriageOrchestrator;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Each
/// conversation is locked individually inside the orchestrator.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed for the server's lifetime.
    pub config: Arc<TriageConfig>,
    /// Live conversations keyed by session id.
    pub orchestrator: Arc<TriageOrchestrator>,
    /// Bearer token required on session routes.
    pub api_token: String,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: TriageConfig, orchestrator: TriageOrchestrator, api_token: String) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            api_token,
            start_time: Instant::now(),
        }
    }
}
