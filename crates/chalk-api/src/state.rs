//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use chalk_chat::{ChatOrchestrator, SessionRegistry};
use chalk_core::ChalkConfig;

/// Shared application state, cloned into every handler task.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed for the life of the server.
    pub config: Arc<ChalkConfig>,
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Live sessions by id.
    pub registry: Arc<SessionRegistry>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ChalkConfig, orchestrator: ChatOrchestrator) -> Self {
        let registry = SessionRegistry::new(u64::from(config.server.session_timeout_minutes));
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            registry: Arc::new(registry),
            start_time: Instant::now(),
        }
    }
}
