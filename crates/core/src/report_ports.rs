//! Port for persisting finished compliance reports

use async_trait::async_trait;
use sentinelpay_domain::{ComplianceReport, Result};

/// Trait for report output sinks (JSON, LaTeX, ...)
///
/// Sinks are pure consumers: they receive a finished report and never
/// modify it.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Write the report to the sink's destination
    async fn write(&self, report: &ComplianceReport) -> Result<()>;

    /// Sink name used in logs
    fn name(&self) -> &str;
}
