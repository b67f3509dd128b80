//! Report assembly from per-record results

use chrono::Utc;
use sentinelpay_domain::{
    ComplianceReport, ComplianceSection, ReportSummary, RunMetadata, RunStatus,
    SanitizationCoverage, SanitizedRecord, SeverityCounts,
};
use uuid::Uuid;

use crate::analysis::AnalysisOutcome;

/// One record that made it through sanitization and analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    /// Position in the submitted batch.
    pub index: usize,
    pub sanitized: SanitizedRecord,
    pub outcome: AnalysisOutcome,
}

/// Assemble the terminal report.
///
/// `records` must be in input order; warnings follow that order.
pub fn assemble_report(
    record_count: usize,
    records: &[ProcessedRecord],
    sections: Vec<ComplianceSection>,
    status: RunStatus,
) -> ComplianceReport {
    let processed = records.len();
    let redacted = records.iter().filter(|r| r.sanitized.was_redacted()).count();
    let degraded = records.iter().filter(|r| r.outcome.is_degraded()).count();

    let metadata = RunMetadata {
        record_count,
        records_processed: processed,
        records_skipped: record_count.saturating_sub(processed),
        records_degraded: degraded,
        coverage: SanitizationCoverage::new(redacted, processed),
        warnings: records.iter().filter_map(|r| r.outcome.warning()).collect(),
    };

    ComplianceReport {
        report_id: Uuid::now_v7().to_string(),
        generated_at: Utc::now(),
        status,
        metadata,
        summary: summarize(records),
        sections,
    }
}

fn summarize(records: &[ProcessedRecord]) -> ReportSummary {
    let mut counts = SeverityCounts::default();
    let mut high_risk_records = 0;
    let mut clean_records = 0;

    for record in records {
        let findings = &record.outcome.findings;
        for finding in findings {
            counts.record(finding.severity);
        }
        if findings.iter().any(|f| f.severity.is_high_risk()) {
            high_risk_records += 1;
        }
        if findings.is_empty() {
            clean_records += 1;
        }
    }

    let compliance_percentage = if records.is_empty() {
        0.0
    } else {
        clean_records as f64 / records.len() as f64 * 100.0
    };

    ReportSummary {
        total_findings: counts.total(),
        findings_by_severity: counts,
        high_risk_records,
        compliance_percentage,
    }
}

#[cfg(test)]
mod tests {
    use sentinelpay_domain::{
        AnalysisError, FindingSource, RecordField, Redaction, RiskCategory, RiskFinding,
        SensitiveCategory, Severity, WarningKind,
    };

    use super::*;

    fn processed(index: usize, redacted: bool, severities: &[Severity]) -> ProcessedRecord {
        let id = format!("tx-{index}");
        let redactions = if redacted {
            vec![Redaction::new(RecordField::Pan, SensitiveCategory::Pan)]
        } else {
            Vec::new()
        };
        let findings = severities
            .iter()
            .map(|severity| RiskFinding {
                record_id: id.clone(),
                severity: *severity,
                category: RiskCategory::Other,
                rationale: String::new(),
                source: FindingSource::Model,
            })
            .collect();

        ProcessedRecord {
            index,
            sanitized: SanitizedRecord {
                id: id.clone(),
                pan_token: None,
                card_brand: None,
                merchant: "m".into(),
                description: String::new(),
                amount: 1.0,
                timestamp: Utc::now(),
                cardholder: None,
                country: None,
                redactions,
            },
            outcome: AnalysisOutcome { record_id: id, findings, failure: None },
        }
    }

    /// Validates the metadata and summary arithmetic.
    ///
    /// Assertions:
    /// - Coverage counts records with at least one redaction.
    /// - Skipped is submitted minus processed.
    /// - High-risk and compliance figures are per record.
    #[test]
    fn computes_metadata_and_summary() {
        let records = vec![
            processed(0, true, &[Severity::Critical, Severity::Low]),
            processed(1, true, &[]),
            processed(2, false, &[Severity::Medium]),
            processed(3, false, &[]),
        ];

        let report = assemble_report(5, &records, Vec::new(), RunStatus::Cancelled);

        assert_eq!(report.metadata.records_processed, 4);
        assert_eq!(report.metadata.records_skipped, 1);
        assert_eq!(report.metadata.coverage.records_redacted, 2);
        assert!((report.metadata.coverage.ratio - 0.5).abs() < 1e-9);
        assert_eq!(report.summary.total_findings, 3);
        assert_eq!(report.summary.findings_by_severity.get(Severity::Critical), 1);
        assert_eq!(report.summary.high_risk_records, 1);
        assert!((report.summary.compliance_percentage - 50.0).abs() < 1e-9);
        assert!(report.is_cancelled());
    }

    #[test]
    fn degraded_records_produce_ordered_warnings() {
        let mut first = processed(0, false, &[]);
        first.outcome.failure = Some(AnalysisError::Unparseable("no json".into()));
        let mut second = processed(1, false, &[]);
        second.outcome.failure =
            Some(AnalysisError::Inference(sentinelpay_domain::InferenceError::Timeout {
                timeout_ms: 10,
            }));

        let report = assemble_report(2, &[first, second], Vec::new(), RunStatus::Completed);

        assert_eq!(report.metadata.records_degraded, 2);
        let kinds: Vec<_> = report.metadata.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WarningKind::AnalysisUnparseable, WarningKind::InferenceTimeout]);
    }

    #[test]
    fn empty_run_reports_zero_percentages() {
        let report = assemble_report(0, &[], Vec::new(), RunStatus::Completed);
        assert_eq!(report.summary.compliance_percentage, 0.0);
        assert_eq!(report.metadata.coverage.ratio, 0.0);
    }
}
