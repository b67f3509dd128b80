//! Privacy Module - Portable Core
//!
//! This module provides portable, domain-independent detection of card
//! numbers and personal data in free text, plus irreversible redaction.

pub mod patterns;

// Re-export commonly used types
pub use patterns::{DetectorConfig, PatternMatcher, PiiError, PiiResult, PiiType};
