//! `sentinelpay run` - produce a compliance report from a transaction log

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use sentinelpay_core::{ReportSink, TransactionSource};
use sentinelpay_domain::{ComplianceReport, RunStatus, Severity};
use sentinelpay_infra::{JsonFileSource, JsonReportSink, LatexReportSink};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::AppContext;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// JSON array of transaction records.
    #[arg(long, short)]
    pub input: PathBuf,

    /// Write the report as pretty JSON.
    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Write the report as LaTeX source (compile with pdflatex).
    #[arg(long)]
    pub latex_out: Option<PathBuf>,

    /// Records analyzed concurrently; overrides the configuration.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// A produced report and the sinks that could not write it.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: ComplianceReport,
    /// One `"<sink>: <error>"` line per failed sink; every sink is attempted.
    pub sink_failures: Vec<String>,
}

impl RunOutcome {
    pub fn all_sinks_written(&self) -> bool {
        self.sink_failures.is_empty()
    }
}

/// Load, run and write every selected sink.
///
/// # Errors
/// An error here means no report was produced: unreadable input or a
/// pipeline stage that exhausted its inference budget. Sink failures come
/// back in [`RunOutcome::sink_failures`] next to the report.
pub async fn run_report(
    args: &RunArgs,
    context: &AppContext,
    cancel: CancellationToken,
) -> anyhow::Result<RunOutcome> {
    let source = JsonFileSource::new(&args.input);
    info!(source = %source.describe(), "loading transactions");
    let records = source.load().await.context("failed to load transactions")?;

    let report = context.pipeline.run_cancellable(records, cancel).await?;

    let mut sinks: Vec<Box<dyn ReportSink>> = Vec::new();
    if let Some(path) = &args.json_out {
        sinks.push(Box::new(JsonReportSink::new(path)));
    }
    if let Some(path) = &args.latex_out {
        sinks.push(Box::new(LatexReportSink::new(path)));
    }
    if sinks.is_empty() {
        warn!("no output sink selected; only the summary is printed");
    }

    let mut sink_failures = Vec::new();
    for sink in &sinks {
        if let Err(err) = sink.write(&report).await {
            error!(sink = sink.name(), error = %err, "report_sink_failed");
            sink_failures.push(format!("{}: {err}", sink.name()));
        }
    }

    Ok(RunOutcome { report, sink_failures })
}

/// Human-readable run summary for stdout.
pub fn render_summary(report: &ComplianceReport) -> String {
    let meta = &report.metadata;
    let summary = &report.summary;
    let counts = &summary.findings_by_severity;
    let status = match report.status {
        RunStatus::Completed => "completed",
        RunStatus::Cancelled => "cancelled",
    };

    let mut out = format!("Report {} ({status})\n", report.report_id);
    out.push_str(&format!(
        "  records:    {} submitted, {} processed, {} skipped, {} degraded\n",
        meta.record_count, meta.records_processed, meta.records_skipped, meta.records_degraded
    ));
    out.push_str(&format!(
        "  redacted:   {} of {} processed records ({:.2}%)\n",
        meta.coverage.records_redacted,
        meta.coverage.records_processed,
        meta.coverage.ratio * 100.0
    ));
    out.push_str(&format!(
        "  findings:   {} (critical {}, high {}, medium {}, low {})\n",
        summary.total_findings,
        counts.get(Severity::Critical),
        counts.get(Severity::High),
        counts.get(Severity::Medium),
        counts.get(Severity::Low)
    ));
    out.push_str(&format!(
        "  high risk:  {} records\n  compliance: {:.2}%\n",
        summary.high_risk_records, summary.compliance_percentage
    ));
    for section in &report.sections {
        out.push_str(&format!(
            "  - {} [{}] {} finding(s)\n",
            section.requirement,
            section.severity,
            section.findings.len()
        ));
    }
    out.push_str(&format!("report produced with {} degraded records", meta.records_degraded));
    out
}
