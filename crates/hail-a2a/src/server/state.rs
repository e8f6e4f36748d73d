use std::sync::Arc;

use hail_core::TaskStreamEngine;

use crate::types::{AgentCard, HealthResponse};

/// Shared by every request handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub card: Arc<AgentCard>,
    pub engine: Arc<dyn TaskStreamEngine>,
    pub health: Arc<HealthResponse>,
}

impl AppState {
    #[must_use]
    pub fn new(card: AgentCard, engine: Arc<dyn TaskStreamEngine>, health: HealthResponse) -> Self {
        Self {
            card: Arc::new(card),
            engine,
            health: Arc::new(health),
        }
    }
}
