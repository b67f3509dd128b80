//! Application context - dependency injection container

use std::sync::Arc;

use sentinelpay_core::{PipelineOrchestrator, TextGenerator};
use sentinelpay_domain::{Result, SentinelConfig};
use sentinelpay_infra::OllamaClient;
use tracing::info;

/// Application context - holds the configured pipeline and its backend
pub struct AppContext {
    pub config: SentinelConfig,
    pub pipeline: PipelineOrchestrator,
    backend: Arc<dyn TextGenerator>,
}

impl AppContext {
    /// Wire the pipeline against the Ollama server named in `config`.
    ///
    /// # Errors
    /// Returns `SentinelError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: SentinelConfig) -> Result<Self> {
        let client = OllamaClient::from_config(&config.inference)?;
        Self::with_backend(config, Arc::new(client))
    }

    /// Wire the pipeline against an arbitrary backend.
    pub fn with_backend(config: SentinelConfig, backend: Arc<dyn TextGenerator>) -> Result<Self> {
        let pipeline = PipelineOrchestrator::from_config(Arc::clone(&backend), &config)?;

        info!(
            backend = backend.name(),
            base_url = %config.inference.base_url,
            risk_model = %config.inference.risk_model,
            compliance_model = %config.inference.compliance_model,
            concurrency = pipeline.max_concurrency(),
            "app_context_initialized"
        );

        Ok(Self { config, pipeline, backend })
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}
