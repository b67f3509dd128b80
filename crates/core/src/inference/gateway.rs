//! Inference gateway - retry and timeout policy around a text generator

use std::sync::Arc;
use std::time::Duration;

use sentinelpay_common::resilience::{
    RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy,
};
use sentinelpay_domain::{InferenceConfig, InferenceError, SentinelError};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::ports::{GenerationOptions, Prompt, TextGenerator};
use super::structured::parse_json;

const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Retries only when the backend is unreachable. Timeouts and malformed
/// responses propagate immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableOnly;

impl RetryPolicy<InferenceError> for UnavailableOnly {
    fn should_retry(&self, error: &InferenceError, _attempt: u32) -> RetryDecision {
        if error.is_unavailable() {
            RetryDecision::Retry
        } else {
            RetryDecision::Stop
        }
    }
}

/// Uniform capability object wrapping a [`TextGenerator`].
///
/// Every call is bounded by `options.timeout` per attempt and retried with
/// exponential backoff while the backend reports itself unavailable. Retry
/// counters are local to each call.
#[derive(Clone)]
pub struct InferenceGateway {
    backend: Arc<dyn TextGenerator>,
    retry: RetryExecutor<UnavailableOnly>,
}

impl InferenceGateway {
    pub fn new(backend: Arc<dyn TextGenerator>, retry: RetryConfig) -> Self {
        Self { backend, retry: RetryExecutor::new(retry, UnavailableOnly) }
    }

    /// Gateway with the default retry budget (3 attempts, 100 ms base).
    pub fn with_defaults(backend: Arc<dyn TextGenerator>) -> Self {
        Self::new(backend, RetryConfig::default())
    }

    /// Build the gateway's retry budget from configuration.
    ///
    /// # Errors
    /// Returns `SentinelError::Config` for a zero attempt budget.
    pub fn from_config(
        backend: Arc<dyn TextGenerator>,
        config: &InferenceConfig,
    ) -> Result<Self, SentinelError> {
        let retry = RetryConfig::builder()
            .max_attempts(config.max_attempts)
            .exponential_backoff(Duration::from_millis(config.base_backoff_ms), 2.0, MAX_BACKOFF)
            .equal_jitter()
            .build()
            .map_err(|err| SentinelError::Config(err.to_string()))?;
        Ok(Self::new(backend, retry))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate text, applying the timeout and retry policy.
    ///
    /// # Errors
    /// - `Timeout` when a single attempt exceeds `options.timeout`
    /// - `Unavailable` once the retry budget is spent, carrying the attempt
    ///   count
    /// - `Malformed` as reported by the backend
    #[instrument(
        skip(self, prompt, options),
        fields(
            backend = %self.backend.name(),
            model = options.model.as_deref().unwrap_or("default")
        )
    )]
    pub async fn generate(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<String, InferenceError> {
        let timeout = options.timeout;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let backend = &self.backend;

        let outcome = self
            .retry
            .execute_with_outcome(|| async move {
                match tokio::time::timeout(timeout, backend.generate(prompt, options)).await {
                    Ok(result) => result,
                    Err(_) => Err(InferenceError::Timeout { timeout_ms }),
                }
            })
            .await;

        let attempts = outcome.attempts;
        match outcome.result {
            Ok(text) => {
                debug!(attempts, response_chars = text.chars().count(), "inference_succeeded");
                Ok(text)
            }
            Err(err) => {
                let err = normalize(err);
                warn!(attempts, error = %err, "inference_failed");
                Err(err)
            }
        }
    }

    /// Generate and validate a JSON payload against schema `T`.
    ///
    /// # Errors
    /// Any [`generate`](Self::generate) error, or `Malformed` when the
    /// completion holds no payload matching `T`.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<T, InferenceError> {
        let text = self.generate(prompt, options).await?;
        parse_json(&text)
    }
}

/// Collapse retry bookkeeping back into the three inference error kinds.
fn normalize(err: RetryError<InferenceError>) -> InferenceError {
    match err {
        RetryError::AttemptsExhausted { attempts, last_error } => match last_error {
            InferenceError::Unavailable { reason, .. } => {
                InferenceError::Unavailable { reason, attempts }
            }
            other => other,
        },
        RetryError::NonRetryable { source, .. } => source,
        RetryError::InvalidConfiguration { message } => {
            InferenceError::Unavailable { reason: message, attempts: 0 }
        }
    }
}
