//! Pipeline orchestration: sanitize, analyze, explain, assemble

pub mod orchestrator;
pub mod report;

pub use orchestrator::PipelineOrchestrator;
pub use report::{assemble_report, ProcessedRecord};
