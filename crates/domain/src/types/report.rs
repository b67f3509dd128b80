//! Compliance report: sections per PCI DSS requirement plus run metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finding::{PciRequirement, RiskFinding, Severity};

/// Whether a section's narrative came from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationStatus {
    Generated,
    Unavailable,
}

/// Findings sharing one PCI DSS requirement, explained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSection {
    pub requirement: PciRequirement,
    pub title: String,
    pub narrative: String,
    pub remediation: String,
    /// Maximum severity across `findings`.
    pub severity: Severity,
    pub findings: Vec<RiskFinding>,
    pub explanation_status: ExplanationStatus,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Why a record was degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Model output did not match the findings schema.
    AnalysisUnparseable,
    InferenceTimeout,
    InferenceUnavailable,
}

/// Warning attached to a degraded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordWarning {
    pub record_id: String,
    pub kind: WarningKind,
    pub message: String,
}

/// Share of processed records that needed at least one redaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SanitizationCoverage {
    pub records_redacted: usize,
    pub records_processed: usize,
    pub ratio: f64,
}

impl SanitizationCoverage {
    pub fn new(records_redacted: usize, records_processed: usize) -> Self {
        let ratio = if records_processed == 0 {
            0.0
        } else {
            records_redacted as f64 / records_processed as f64
        };
        Self { records_redacted, records_processed, ratio }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Records submitted to the run.
    pub record_count: usize,
    /// Records that completed sanitization and analysis.
    pub records_processed: usize,
    /// Records never processed because the run was cancelled.
    pub records_skipped: usize,
    /// Processed records whose analysis failed.
    pub records_degraded: usize,
    pub coverage: SanitizationCoverage,
    pub warnings: Vec<RecordWarning>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.critical
    }
}

/// Daily-summary style totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_findings: usize,
    pub findings_by_severity: SeverityCounts,
    /// Records with at least one high or critical finding.
    pub high_risk_records: usize,
    /// Percentage of processed records without any finding; zero when
    /// nothing was processed.
    pub compliance_percentage: f64,
}

/// Terminal artifact of a pipeline run. Never mutated after assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub status: RunStatus,
    pub metadata: RunMetadata,
    pub summary: ReportSummary,
    /// Sorted by requirement.
    pub sections: Vec<ComplianceSection>,
}

impl ComplianceReport {
    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }

    /// All findings across sections, in section order.
    pub fn findings(&self) -> impl Iterator<Item = &RiskFinding> {
        self.sections.iter().flat_map(|section| section.findings.iter())
    }

    pub fn section(&self, requirement: PciRequirement) -> Option<&ComplianceSection> {
        self.sections.iter().find(|section| section.requirement == requirement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_ratio_handles_empty_runs() {
        assert_eq!(SanitizationCoverage::new(0, 0).ratio, 0.0);
        let coverage = SanitizationCoverage::new(2, 3);
        assert!((coverage.ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn severity_counts_tally() {
        let mut counts = SeverityCounts::default();
        for severity in [Severity::Low, Severity::Critical, Severity::Critical] {
            counts.record(severity);
        }
        assert_eq!(counts.get(Severity::Critical), 2);
        assert_eq!(counts.total(), 3);
    }
}
