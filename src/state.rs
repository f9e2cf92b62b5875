use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::services::Services;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<TokenVerifier>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, verifier: TokenVerifier, config: AppConfig) -> Self {
        Self {
            services: Services::new(store.clone(), &config),
            store,
            verifier: Arc::new(verifier),
            config: Arc::new(config),
        }
    }
}
