/// Ollama chat client implementing the text-generation port
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use sentinelpay_core::{GenerationOptions, Prompt, TextGenerator};
use sentinelpay_domain::{InferenceConfig, InferenceError, SentinelError};
use tracing::{debug, warn};

use super::types::{ChatMessage, ChatOptions, ChatRequest, ChatResponse, OllamaError};
use crate::http::HttpClient;

const CHAT_PATH: &str = "/api/chat";
const USER_AGENT: &str = concat!("sentinelpay/", env!("CARGO_PKG_VERSION"));

/// Ollama API client
pub struct OllamaClient {
    http_client: HttpClient,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:11434`)
    pub fn new(base_url: impl Into<String>, http_client: HttpClient) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
            model: sentinelpay_domain::constants::DEFAULT_RISK_MODEL.to_string(),
        }
    }

    /// Build from the inference section of the application config.
    ///
    /// The HTTP timeout matches the per-attempt timeout so a stalled
    /// connection is released when the gateway gives up on it.
    ///
    /// # Errors
    /// Returns `SentinelError::Config` if the HTTP client cannot be built.
    pub fn from_config(config: &InferenceConfig) -> Result<Self, SentinelError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self::new(&config.base_url, http_client).with_model(&config.risk_model))
    }

    /// Model used when a call does not name one
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn chat(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<String, OllamaError> {
        let model = options.model.as_deref().unwrap_or(&self.model);
        let timeout_ms = u64::try_from(options.timeout.as_millis()).unwrap_or(u64::MAX);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &prompt.system {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: &prompt.user });

        let payload = ChatRequest {
            model,
            messages,
            stream: false,
            options: ChatOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let request = self
            .http_client
            .request(Method::POST, format!("{}{CHAT_PATH}", self.base_url))
            .timeout(options.timeout)
            .json(&payload);

        let response = self
            .http_client
            .send(request)
            .await
            .map_err(|err| transport_error(&err, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            if status != StatusCode::TOO_MANY_REQUESTS && status.is_client_error() {
                warn!(status = status.as_u16(), model, "Ollama rejected request");
            }
            return Err(OllamaError::Api { status: status.as_u16() });
        }

        let envelope: ChatResponse = response.json().await.map_err(|err| {
            if err.is_timeout() {
                OllamaError::Timeout { timeout_ms }
            } else {
                OllamaError::InvalidEnvelope("body is not an Ollama chat response".into())
            }
        })?;

        debug!(model, eval_count = envelope.eval_count, "Ollama completion received");
        Ok(envelope.message.content)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<String, InferenceError> {
        self.chat(prompt, options).await.map_err(InferenceError::from)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// reqwest error text embeds the request URL; keep only the failure kind.
fn transport_error(err: &reqwest::Error, timeout_ms: u64) -> OllamaError {
    if err.is_timeout() {
        OllamaError::Timeout { timeout_ms }
    } else if err.is_connect() {
        OllamaError::Connection("connection failure".into())
    } else if err.is_builder() {
        OllamaError::Connection("invalid request URL".into())
    } else {
        OllamaError::Connection("transport error".into())
    }
}
