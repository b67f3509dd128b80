//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Inference defaults
pub const DEFAULT_INFERENCE_URL: &str = "http://localhost:11434";
pub const DEFAULT_RISK_MODEL: &str = "sentinel-risk-analyzer";
pub const DEFAULT_COMPLIANCE_MODEL: &str = "sentinel-compliance-explainer";

// Rule screen
pub const DEFAULT_HIGH_VALUE_THRESHOLD: f64 = 1000.0;

// Report text
pub const EXPLANATION_UNAVAILABLE: &str = "explanation unavailable";
pub const REPORT_TITLE: &str = "PCI-DSS Compliance Violation Report";
pub const REPORT_AUTHOR: &str = "SentinelPay Analysis Engine";

// Prompt limits
pub const MAX_FINDINGS_PER_PROMPT: usize = 25;
pub const MAX_RATIONALE_CHARS: usize = 600;

// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "SENTINELPAY_";
