use crate::tools::ToolRegistry;
use nexus_provider::{ChatExecutor, MediaClient, ModelConfig};
use std::sync::Arc;

/// Shared state of the gateway.
#[derive(Clone)]
pub struct AppState {
    /// Chat inference backend.
    pub executor: Arc<dyn ChatExecutor>,
    /// Binary media backend.
    pub media: Arc<dyn MediaClient>,
    /// Model ids used per capability.
    pub models: ModelConfig,
    /// Tools available to the tool-calling endpoint.
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    /// Assemble state from its parts.
    pub fn new(
        executor: Arc<dyn ChatExecutor>,
        media: Arc<dyn MediaClient>,
        models: ModelConfig,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            executor,
            media,
            models,
            tools: Arc::new(tools),
        }
    }
}
