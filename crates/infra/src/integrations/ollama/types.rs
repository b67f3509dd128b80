/// Ollama chat API types
use sentinelpay_domain::InferenceError;
use serde::{Deserialize, Serialize};

/// Ollama adapter error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OllamaError {
    /// Could not reach the server (refused, DNS, reset)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Server answered with a non-success status
    #[error("API error (status {status})")]
    Api { status: u16 },

    /// Request did not complete within the client timeout
    #[error("Request timeout after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Response body is not a chat envelope
    #[error("Invalid response envelope: {0}")]
    InvalidEnvelope(String),
}

// 4xx other than 429 usually means an unknown model; retrying will not help
// but the backend is still unusable, so it counts as unavailable.
impl From<OllamaError> for InferenceError {
    fn from(err: OllamaError) -> Self {
        match err {
            OllamaError::Connection(reason) => InferenceError::unavailable(reason),
            OllamaError::Api { status } => InferenceError::unavailable(format!("HTTP {status}")),
            OllamaError::Timeout { timeout_ms } => InferenceError::Timeout { timeout_ms },
            OllamaError::InvalidEnvelope(detail) => InferenceError::Malformed(detail),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub stream: bool,
    pub options: ChatOptions,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

/// Non-streaming response from `/api/chat`
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub message: ResponseMessage,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: String,
}
