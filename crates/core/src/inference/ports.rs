//! Port interfaces for text generation

use std::time::Duration;

use async_trait::async_trait;
use sentinelpay_domain::InferenceError;

/// Prompt sent to a text generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn new(user: impl Into<String>) -> Self {
        Self { system: None, user: user.into() }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Per-call generation options
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Backend model name; `None` lets the backend choose its default
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Bound on a single attempt
    pub timeout: Duration,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { model: None, temperature: 0.0, max_tokens: 1024, timeout: Duration::from_secs(60) }
    }
}

impl GenerationOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Trait for text-generation backends
///
/// Implementations submit a prompt and return the raw completion text.
/// Every failure must be reported as one of the three
/// [`InferenceError`] kinds; transport details belong in logs.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<String, InferenceError>;

    /// Backend name used in logs
    fn name(&self) -> &str;
}
