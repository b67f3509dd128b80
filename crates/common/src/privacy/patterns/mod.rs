//! PII Pattern Detection - Portable Core
//!
//! This module provides portable, domain-independent PAN and PII pattern
//! detection: card-number validation, configurable detectors, overlap
//! resolution, and placeholder redaction.

pub mod card;
pub mod config;
pub mod core;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use core::{is_placeholder, placeholder, PatternMatcher, Redacted};

pub use card::{card_brand, digits_of, luhn_check, CardBrand};
pub use config::DetectorConfig;
pub use error::{PiiError, PiiResult};
pub use types::{DetectionMethod, PiiEntity, PiiType};
