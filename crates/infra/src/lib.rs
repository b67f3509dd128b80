//! # SentinelPay Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The Ollama text-generation adapter and its HTTP client
//! - Configuration loading (files plus `SENTINELPAY_*` overrides)
//! - Transaction ingestion from JSON files
//! - Report sinks (JSON, LaTeX)
//! - Synthetic transaction log generation
//!
//! ## Architecture
//! - Implements traits defined in `sentinelpay-core`
//! - Contains all "impure" code (network, filesystem)

pub mod config;
pub mod errors;
pub mod http;
pub mod ingest;
pub mod integrations;
pub mod reports;
pub mod synthetic;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::HttpClient;
pub use ingest::{parse_transactions, JsonFileSource};
pub use integrations::ollama::OllamaClient;
pub use reports::{JsonReportSink, LatexReportSink};
pub use synthetic::{write_transactions, SyntheticConfig, SyntheticGenerator};
