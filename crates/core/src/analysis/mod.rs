//! Risk analysis stage
//!
//! Model-driven findings per sanitized record, followed by a deterministic
//! rule screen.

pub mod analyzer;
pub mod rules;

pub use analyzer::{AnalysisOutcome, BatchAnalysis, RiskAnalyzer};
pub use rules::RuleScreen;
