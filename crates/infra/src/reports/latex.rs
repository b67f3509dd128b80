//! LaTeX report sink
//!
//! Emits document source only; PDF generation is left to an external TeX
//! toolchain (`pdflatex report.tex`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sentinelpay_core::ReportSink;
use sentinelpay_domain::constants::{REPORT_AUTHOR, REPORT_TITLE};
use sentinelpay_domain::{
    ComplianceReport, ComplianceSection, ExplanationStatus, Result, RunStatus, Severity,
};
use tracing::info;

use super::write_file;

const PREAMBLE: &str = r"\documentclass{article}
\usepackage[head=40pt,margin=0.7in,bottom=0.7in]{geometry}
\usepackage[T1]{fontenc}
\usepackage[utf8]{inputenc}
\usepackage{xcolor}
\usepackage{booktabs}
\usepackage{longtable}
\usepackage{array}
\usepackage{fancyhdr}
\usepackage{parskip}
\definecolor{sentinelblue}{HTML}{0D47A1}
\pagestyle{fancy}
\fancyhf{}
\rhead{\small\textit{SentinelPay Analysis}}
\lhead{\small\textit{PCI-DSS Compliance Report}}
\cfoot{\thepage}
";

#[derive(Debug, Clone)]
pub struct LatexReportSink {
    path: PathBuf,
}

impl LatexReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSink for LatexReportSink {
    async fn write(&self, report: &ComplianceReport) -> Result<()> {
        let source = render_latex(report);
        write_file(&self.path, source.as_bytes()).await?;

        info!(path = %self.path.display(), report_id = %report.report_id, "latex_report_written");
        Ok(())
    }

    fn name(&self) -> &str {
        "latex"
    }
}

/// Render the full document source for `report`.
pub fn render_latex(report: &ComplianceReport) -> String {
    let mut doc = String::from(PREAMBLE);

    doc.push_str(&format!("\\title{{{}}}\n", escape(REPORT_TITLE)));
    doc.push_str(&format!("\\author{{{}}}\n", escape(REPORT_AUTHOR)));
    doc.push_str(&format!("\\date{{{}}}\n", report.generated_at.format("%B %d, %Y")));
    doc.push_str("\\begin{document}\n\\maketitle\n\n");

    render_summary(&mut doc, report);
    render_overview(&mut doc, &report.sections);

    if !report.sections.is_empty() {
        doc.push_str("\\newpage\n\\section*{Detailed Violation Analysis}\n\n");
        for section in &report.sections {
            render_section(&mut doc, section);
        }
    }

    render_warnings(&mut doc, report);

    doc.push_str("\\end{document}\n");
    doc
}

fn render_summary(doc: &mut String, report: &ComplianceReport) {
    let meta = &report.metadata;
    let summary = &report.summary;

    doc.push_str("\\section*{Run Summary}\n");
    if report.status == RunStatus::Cancelled {
        doc.push_str(
            "\\textbf{\\textcolor{red}{This run was cancelled.}} Figures cover only the records \
             processed before cancellation.\n\n",
        );
    }

    doc.push_str("\\begin{tabular}{l r}\n\\toprule\n");
    let rows = [
        ("Report ID", escape(&report.report_id)),
        ("Records submitted", meta.record_count.to_string()),
        ("Records processed", meta.records_processed.to_string()),
        ("Records skipped", meta.records_skipped.to_string()),
        ("Records degraded", meta.records_degraded.to_string()),
        ("Sanitization coverage", format!("{:.2}\\%", meta.coverage.ratio * 100.0)),
        ("Total findings", summary.total_findings.to_string()),
        ("High-risk records", summary.high_risk_records.to_string()),
        ("Compliance", format!("{:.2}\\%", summary.compliance_percentage)),
    ];
    for (label, value) in rows {
        doc.push_str(&format!("{label} & {value} \\\\\n"));
    }
    doc.push_str("\\midrule\n");
    for severity in [Severity::Critical, Severity::High, Severity::Medium, Severity::Low] {
        doc.push_str(&format!(
            "{} findings & {} \\\\\n",
            severity_label(severity),
            summary.findings_by_severity.get(severity)
        ));
    }
    doc.push_str("\\bottomrule\n\\end{tabular}\n\n");
}

fn render_overview(doc: &mut String, sections: &[ComplianceSection]) {
    doc.push_str("\\section*{Violations Summary}\n");
    if sections.is_empty() {
        doc.push_str("No findings were raised for the processed records.\n\n");
        return;
    }

    doc.push_str("\\begin{tabular}{l p{8cm} l r}\n\\toprule\n");
    doc.push_str(
        "\\textbf{Requirement} & \\textbf{Title} & \\textbf{Severity} & \\textbf{Findings} \\\\\n",
    );
    doc.push_str("\\midrule\n");
    for section in sections {
        doc.push_str(&format!(
            "{} & {} & {} & {} \\\\\n",
            section.requirement.code(),
            escape(&section.title),
            severity_cell(section.severity),
            section.findings.len()
        ));
    }
    doc.push_str("\\bottomrule\n\\end{tabular}\n\n");
}

fn render_section(doc: &mut String, section: &ComplianceSection) {
    doc.push_str(&format!(
        "\\subsection*{{Requirement {}: {}}}\n",
        section.requirement.code(),
        escape(&section.title)
    ));
    doc.push_str(&format!("\\textbf{{Severity:}} {}\n\n", severity_cell(section.severity)));

    doc.push_str("\\textbf{Explanation:} ");
    if section.explanation_status == ExplanationStatus::Unavailable {
        doc.push_str("\\textit{(automated explanation unavailable)} ");
    }
    doc.push_str(&escape(&section.narrative));
    doc.push_str("\n\n");

    doc.push_str(&format!("\\textbf{{Remediation:}} {}\n\n", escape(&section.remediation)));

    doc.push_str("\\begin{longtable}{l l l p{7cm}}\n\\toprule\n");
    doc.push_str(
        "\\textbf{Record} & \\textbf{Severity} & \\textbf{Category} & \\textbf{Rationale} \\\\\n",
    );
    doc.push_str("\\midrule\n\\endhead\n");
    for finding in &section.findings {
        doc.push_str(&format!(
            "{} & {} & {} & {} \\\\\n",
            escape(&finding.record_id),
            severity_cell(finding.severity),
            escape(finding.category.as_str()),
            escape(&finding.rationale)
        ));
    }
    doc.push_str("\\bottomrule\n\\end{longtable}\n\\vspace{5mm}\\hrule\n\n");
}

fn render_warnings(doc: &mut String, report: &ComplianceReport) {
    let warnings = &report.metadata.warnings;
    if warnings.is_empty() {
        return;
    }

    doc.push_str("\\section*{Degraded Records}\n\\begin{itemize}\n");
    for warning in warnings {
        doc.push_str(&format!(
            "\\item {}: {}\n",
            escape(&warning.record_id),
            escape(&warning.message)
        ));
    }
    doc.push_str("\\end{itemize}\n\n");
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Critical",
        Severity::High => "High",
        Severity::Medium => "Medium",
        Severity::Low => "Low",
    }
}

fn severity_cell(severity: Severity) -> String {
    let label = severity_label(severity);
    if severity == Severity::Critical {
        format!("\\textbf{{\\textcolor{{red}}{{{label}}}}}")
    } else {
        label.to_string()
    }
}

/// Escape text for LaTeX body content.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '\n' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sentinelpay_domain::{
        FindingSource, PciRequirement, RecordWarning, ReportSummary, RiskCategory, RiskFinding,
        RunMetadata, SanitizationCoverage, SeverityCounts, WarningKind,
    };

    use super::*;

    fn report(status: RunStatus) -> ComplianceReport {
        let finding = RiskFinding {
            record_id: "tx_1".into(),
            severity: Severity::Critical,
            category: RiskCategory::SensitiveAuthenticationData,
            rationale: "CVV present & stored at 100%".into(),
            source: FindingSource::Rule,
        };
        let mut counts = SeverityCounts::default();
        counts.record(Severity::Critical);

        ComplianceReport {
            report_id: "rep-1".into(),
            generated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            status,
            metadata: RunMetadata {
                record_count: 2,
                records_processed: 2,
                records_skipped: 0,
                records_degraded: 1,
                coverage: SanitizationCoverage::new(1, 2),
                warnings: vec![RecordWarning {
                    record_id: "tx_2".into(),
                    kind: WarningKind::InferenceTimeout,
                    message: "inference timed out after 100 ms".into(),
                }],
            },
            summary: ReportSummary {
                total_findings: 1,
                findings_by_severity: counts,
                high_risk_records: 1,
                compliance_percentage: 50.0,
            },
            sections: vec![ComplianceSection {
                requirement: PciRequirement::NoSensitiveAuthData,
                title: PciRequirement::NoSensitiveAuthData.title().into(),
                narrative: "explanation unavailable".into(),
                remediation: PciRequirement::NoSensitiveAuthData.standard_remediation().into(),
                severity: Severity::Critical,
                findings: vec![finding],
                explanation_status: ExplanationStatus::Unavailable,
            }],
        }
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape("a_b & 50% {x}"), "a\\_b \\& 50\\% \\{x\\}");
        assert_eq!(
            escape("c:\\tmp ~ ^"),
            "c:\\textbackslash{}tmp \\textasciitilde{} \\textasciicircum{}"
        );
    }

    /// Validates the rendered document structure.
    ///
    /// Assertions:
    /// - Title and author come from the report constants
    /// - Critical severity is rendered in red
    /// - Finding text is escaped
    /// - Degraded records are listed
    #[test]
    fn renders_sections_and_warnings() {
        let doc = render_latex(&report(RunStatus::Completed));

        assert!(doc.starts_with("\\documentclass{article}"));
        assert!(doc.contains("\\title{PCI-DSS Compliance Violation Report}"));
        assert!(doc.contains("\\author{SentinelPay Analysis Engine}"));
        assert!(doc.contains("\\date{June 01, 2024}"));
        assert!(doc.contains("\\subsection*{Requirement 3.2:"));
        assert!(doc.contains("\\textbf{\\textcolor{red}{Critical}}"));
        assert!(doc.contains("tx\\_1"));
        assert!(doc.contains("CVV present \\& stored at 100\\%"));
        assert!(doc.contains("\\item tx\\_2: inference timed out after 100 ms"));
        assert!(doc.trim_end().ends_with("\\end{document}"));
        assert!(!doc.contains("This run was cancelled"));
    }

    #[test]
    fn flags_cancelled_runs() {
        let doc = render_latex(&report(RunStatus::Cancelled));
        assert!(doc.contains("This run was cancelled."));
    }
}
