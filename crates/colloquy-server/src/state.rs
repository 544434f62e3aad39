use colloquy::agents::AgentRegistry;
use colloquy::providers::factory::{EnvProviderSource, ProviderSource};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub registry: Arc<AgentRegistry>,
    pub provider_source: Arc<dyn ProviderSource>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(AgentRegistry::default()),
            provider_source: Arc::new(EnvProviderSource),
        }
    }
}

// Manual Clone implementation since the provider source is behind a trait object
impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            provider_source: Arc::clone(&self.provider_source),
        }
    }
}
