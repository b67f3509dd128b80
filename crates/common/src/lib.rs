//! Modular common utilities shared across SentinelPay crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: PAN/PII pattern detection and card-number validation
//! - `runtime`: async infrastructure (retry with backoff)
//! - `observability`: optional tracing (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod privacy;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use privacy::patterns::{CardBrand, PatternMatcher, PiiEntity, PiiType, Redacted};
#[cfg(feature = "runtime")]
pub use resilience::{RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy};
