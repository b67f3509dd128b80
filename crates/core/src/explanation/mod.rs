//! Compliance explanation stage

pub mod explainer;
pub mod grouping;

pub use explainer::{ComplianceExplainer, ExplanationOutcome, GroupFailure};
pub use grouping::{group_by_requirement, FindingGroup};
