//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COMPLIANCE_MODEL, DEFAULT_HIGH_VALUE_THRESHOLD, DEFAULT_INFERENCE_URL,
    DEFAULT_RISK_MODEL,
};
use crate::errors::{Result, SentinelError};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub inference: InferenceConfig,
    pub sanitizer: SanitizerConfig,
    pub rules: RuleConfig,
    pub pipeline: PipelineConfig,
}

impl SentinelConfig {
    /// Reject values that would make the pipeline misbehave.
    ///
    /// # Errors
    /// Returns `SentinelError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(SentinelError::Config(msg.to_string()));

        if self.inference.base_url.trim().is_empty() {
            return fail("inference.base_url must not be empty");
        }
        if self.inference.timeout_ms == 0 {
            return fail("inference.timeout_ms must be greater than 0");
        }
        if self.inference.max_attempts == 0 {
            return fail("inference.max_attempts must be greater than 0");
        }
        if !(0.0..=2.0).contains(&self.inference.temperature) {
            return fail("inference.temperature must be within 0.0..=2.0");
        }
        if self.sanitizer.visible_suffix_digits > 4 {
            return fail("sanitizer.visible_suffix_digits must not exceed 4");
        }
        if self.sanitizer.pan_min_digits > self.sanitizer.pan_max_digits {
            return fail("sanitizer.pan_min_digits must not exceed sanitizer.pan_max_digits");
        }
        if !self.rules.high_value_threshold.is_finite() || self.rules.high_value_threshold < 0.0 {
            return fail("rules.high_value_threshold must be a non-negative number");
        }
        if self.pipeline.max_concurrency == 0 {
            return fail("pipeline.max_concurrency must be greater than 0");
        }
        Ok(())
    }
}

/// Inference backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub base_url: String,
    /// Model used by the risk analyzer.
    pub risk_model: String,
    /// Model used by the compliance explainer.
    pub compliance_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt bound on a single generation call.
    pub timeout_ms: u64,
    /// Attempts per call, including the first, for unavailable backends.
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INFERENCE_URL.to_string(),
            risk_model: DEFAULT_RISK_MODEL.to_string(),
            compliance_model: DEFAULT_COMPLIANCE_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            timeout_ms: 60_000,
            max_attempts: 3,
            base_backoff_ms: 200,
        }
    }
}

/// Sanitizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    pub pan_min_digits: usize,
    pub pan_max_digits: usize,
    /// Digits of the PAN kept in the masked token.
    pub visible_suffix_digits: usize,
    pub detect_emails: bool,
    pub detect_names: bool,
    pub detect_addresses: bool,
    pub detect_phones: bool,
    pub detect_authentication_data: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            pan_min_digits: 13,
            pan_max_digits: 19,
            visible_suffix_digits: 4,
            detect_emails: true,
            detect_names: true,
            detect_addresses: true,
            detect_phones: true,
            detect_authentication_data: true,
        }
    }
}

/// Deterministic rule screen configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub enabled: bool,
    /// Amounts strictly above this value are flagged as outliers.
    pub high_value_threshold: f64,
    /// Countries the acquirer normally sees. A record from any other country
    /// is a geographic anomaly; an empty list turns the rule off.
    pub expected_countries: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            high_value_threshold: DEFAULT_HIGH_VALUE_THRESHOLD,
            expected_countries: Vec::new(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Records analyzed concurrently.
    pub max_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}
