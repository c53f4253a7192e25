//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::models::ModelService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    models: ModelService,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Self {
        let models = ModelService::new(
            config.storage.models_dir.clone(),
            config.server.base_url.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner { config, models }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the model service
    pub fn models(&self) -> &ModelService {
        &self.inner.models
    }
}
