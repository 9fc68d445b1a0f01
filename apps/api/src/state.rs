use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::GenerativeProvider;
use crate::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Model provider, shared with the pipeline. Used directly only for catalog diagnostics.
    pub provider: Arc<dyn GenerativeProvider>,
    pub pipeline: Pipeline,
    pub config: Config,
}

impl AppState {
    pub fn new(provider: Arc<dyn GenerativeProvider>, config: Config) -> Self {
        Self {
            pipeline: Pipeline::new(provider.clone()),
            provider,
            config,
        }
    }
}
