//! Error types used throughout the application

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::WarningKind;

/// Normalized failure of a text-generation call.
///
/// Backend-specific details (status codes, transport errors) are logged by
/// the adapter and reduced to one of these three kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("inference timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("inference backend unavailable after {attempts} attempt(s): {reason}")]
    Unavailable { reason: String, attempts: u32 },

    #[error("malformed inference response: {0}")]
    Malformed(String),
}

impl InferenceError {
    /// Single-attempt unavailability, as reported by an adapter.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into(), attempts: 1 }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Failure to turn one sanitized record into findings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The model answered, but not in the findings schema.
    #[error("analysis output unparseable: {0}")]
    Unparseable(String),

    #[error(transparent)]
    Inference(InferenceError),
}

// Malformed responses are a schema problem, not a transport one.
impl From<InferenceError> for AnalysisError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Malformed(detail) => Self::Unparseable(detail),
            other => Self::Inference(other),
        }
    }
}

impl AnalysisError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Inference(err) if err.is_unavailable())
    }

    pub fn warning_kind(&self) -> WarningKind {
        match self {
            Self::Unparseable(_) => WarningKind::AnalysisUnparseable,
            Self::Inference(InferenceError::Timeout { .. }) => WarningKind::InferenceTimeout,
            Self::Inference(InferenceError::Unavailable { .. }) => {
                WarningKind::InferenceUnavailable
            }
            Self::Inference(InferenceError::Malformed(_)) => WarningKind::AnalysisUnparseable,
        }
    }
}

/// Pipeline stage that can exhaust its inference budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Analysis,
    Explanation,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Analysis => f.write_str("analysis"),
            Self::Explanation => f.write_str("explanation"),
        }
    }
}

/// Hard failure of a pipeline run. No partial report is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("{stage} stage exhausted its inference retry budget ({failures} unavailable call(s))")]
    Exhausted { stage: PipelineStage, failures: usize },
}

/// Main error type for SentinelPay
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SentinelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for SentinelError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SentinelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<InferenceError> for SentinelError {
    fn from(err: InferenceError) -> Self {
        Self::Inference(err.to_string())
    }
}

impl From<PipelineError> for SentinelError {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline(err.to_string())
    }
}

/// Result type alias for SentinelPay operations
pub type Result<T> = std::result::Result<T, SentinelError>;
