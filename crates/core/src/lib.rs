//! # SentinelPay Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for inference, ingestion and report
//!   sinks
//! - The three pipeline stages: sanitization, risk analysis, compliance
//!   explanation
//! - The orchestrator that runs them over a batch
//!
//! ## Architecture Principles
//! - Only depends on `sentinelpay-common` and `sentinelpay-domain`
//! - No HTTP, file or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod analysis;
pub mod explanation;
pub mod inference;
pub mod pipeline;
pub mod sanitization;

// Infrastructure ports
pub mod ingest_ports;
pub mod report_ports;

// Re-export specific items to avoid ambiguity
pub use analysis::{AnalysisOutcome, BatchAnalysis, RiskAnalyzer, RuleScreen};
pub use explanation::{group_by_requirement, ComplianceExplainer, ExplanationOutcome, FindingGroup};
pub use inference::{GenerationOptions, InferenceGateway, Prompt, TextGenerator};
pub use ingest_ports::TransactionSource;
pub use pipeline::PipelineOrchestrator;
pub use report_ports::ReportSink;
pub use sanitization::{Sanitizable, Sanitizer};
