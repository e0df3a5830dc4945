use crate::config::AppConfig;
use factcheck_core::{AgentConfig, Config, LiveProviders, ProviderFactory};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared, read-only handles; nothing here changes between requests.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    providers: Arc<dyn ProviderFactory>,
    static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let providers = Arc::new(LiveProviders::new(Arc::new(config.factcheck.clone())));
        Self::with_providers(config, providers)
    }

    /// Build state around a custom provider factory (mock models in tests).
    pub fn with_providers(config: &AppConfig, providers: Arc<dyn ProviderFactory>) -> Self {
        Self {
            config: Arc::new(config.factcheck.clone()),
            providers,
            static_dir: Arc::new(config.static_dir.clone()),
        }
    }

    pub fn providers(&self) -> Arc<dyn ProviderFactory> {
        self.providers.clone()
    }

    pub fn agent_config(&self) -> &AgentConfig {
        &self.config.agents
    }

    pub fn model_name(&self) -> &str {
        &self.config.model.name
    }

    pub fn static_dir(&self) -> Arc<PathBuf> {
        self.static_dir.clone()
    }
}
