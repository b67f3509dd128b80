//! Domain types and models
//!
//! Data flows strictly downstream through these types: a raw
//! [`TransactionRecord`] becomes a [`SanitizedRecord`], which yields zero or
//! more [`RiskFinding`]s, grouped into [`ComplianceSection`]s of a
//! [`ComplianceReport`].

pub mod finding;
pub mod report;
pub mod transaction;

pub use finding::{FindingSource, PciRequirement, RiskCategory, RiskFinding, Severity};
pub use report::{
    ComplianceReport, ComplianceSection, ExplanationStatus, RecordWarning, ReportSummary,
    RunMetadata, RunStatus, SanitizationCoverage, SeverityCounts, WarningKind,
};
pub use transaction::{
    parse_timestamp, Location, RecordField, Redaction, SanitizedRecord, SensitiveCategory,
    TransactionRecord,
};
