//! Pipeline orchestrator - bounded per-record fan-out, barrier, explanation

use std::sync::Arc;
use std::time::Duration;

use sentinelpay_domain::{
    ComplianceReport, PipelineError, PipelineStage, RunStatus, SentinelConfig, SentinelError,
    TransactionRecord,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::report::{assemble_report, ProcessedRecord};
use crate::analysis::{RiskAnalyzer, RuleScreen};
use crate::explanation::{group_by_requirement, ComplianceExplainer};
use crate::inference::{GenerationOptions, InferenceGateway, TextGenerator};
use crate::sanitization::Sanitizer;

const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Runs sanitize, analyze and explain over a batch of records.
///
/// The per-record phase runs on spawned tasks, at most `max_concurrency` at
/// a time; results are collected by input position, so no worker writes into
/// shared state. Explanation starts only after every record has been
/// analyzed.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    sanitizer: Arc<Sanitizer>,
    analyzer: RiskAnalyzer,
    explainer: ComplianceExplainer,
    max_concurrency: usize,
}

impl PipelineOrchestrator {
    pub fn new(
        sanitizer: Arc<Sanitizer>,
        analyzer: RiskAnalyzer,
        explainer: ComplianceExplainer,
    ) -> Self {
        Self { sanitizer, analyzer, explainer, max_concurrency: DEFAULT_MAX_CONCURRENCY }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Wire every stage from configuration around one backend.
    ///
    /// # Errors
    /// Returns `SentinelError::Config` when the configuration is invalid.
    pub fn from_config(
        backend: Arc<dyn TextGenerator>,
        config: &SentinelConfig,
    ) -> Result<Self, SentinelError> {
        config.validate()?;

        let sanitizer = Arc::new(Sanitizer::new(&config.sanitizer)?);
        let gateway = InferenceGateway::from_config(backend, &config.inference)?;

        let inference = &config.inference;
        let base_options = GenerationOptions::default()
            .with_temperature(inference.temperature)
            .with_max_tokens(inference.max_tokens)
            .with_timeout(Duration::from_millis(inference.timeout_ms));

        let mut analyzer = RiskAnalyzer::new(
            gateway.clone(),
            Arc::clone(&sanitizer),
            base_options.clone().with_model(&inference.risk_model),
        );
        if let Some(rules) = RuleScreen::from_config(&config.rules) {
            analyzer = analyzer.with_rules(rules);
        }

        let explainer = ComplianceExplainer::new(
            gateway,
            Arc::clone(&sanitizer),
            base_options.with_model(&inference.compliance_model),
        );

        Ok(Self::new(sanitizer, analyzer, explainer)
            .with_max_concurrency(config.pipeline.max_concurrency))
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run to completion.
    ///
    /// # Errors
    /// `PipelineError::Exhausted` when a whole stage lost its backend.
    pub async fn run(
        &self,
        records: Vec<TransactionRecord>,
    ) -> Result<ComplianceReport, PipelineError> {
        self.run_cancellable(records, CancellationToken::new()).await
    }

    /// Run until done or until `cancel` fires.
    ///
    /// A cancelled run stops accepting record results, makes no further
    /// model calls and returns a report tagged cancelled that covers only
    /// the records completed so far, with mechanical sections.
    ///
    /// # Errors
    /// `PipelineError::Exhausted` when, in a run that was not cancelled,
    /// every analyzed record or every explanation group failed because the
    /// backend was unavailable. No partial report is produced then.
    #[instrument(skip(self, records, cancel), fields(records = records.len()))]
    pub async fn run_cancellable(
        &self,
        records: Vec<TransactionRecord>,
        cancel: CancellationToken,
    ) -> Result<ComplianceReport, PipelineError> {
        let total = records.len();
        info!(records = total, concurrency = self.max_concurrency, "pipeline_started");

        let mut processed = self.process_records(records, &cancel).await;
        processed.sort_by_key(|record| record.index);
        let mut cancelled = cancel.is_cancelled();

        if !cancelled {
            check_analysis_exhaustion(&processed)?;
        }

        for record in processed.iter().filter(|r| r.outcome.is_degraded()) {
            if let Some(warning) = record.outcome.warning() {
                warn!(record_id = %warning.record_id, kind = ?warning.kind, "record_degraded");
            }
        }

        let groups = group_by_requirement(
            processed.iter().flat_map(|record| record.outcome.findings.iter().cloned()),
        );

        let sections = if cancelled {
            ComplianceExplainer::explain_mechanically(groups)
        } else {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    cancelled = true;
                    ComplianceExplainer::explain_mechanically(groups)
                }
                outcome = self.explainer.explain(groups.clone()) => {
                    if outcome.all_unavailable() {
                        warn!(failures = outcome.failures.len(), "explanation_stage_exhausted");
                        return Err(PipelineError::Exhausted {
                            stage: PipelineStage::Explanation,
                            failures: outcome.failures.len(),
                        });
                    }
                    outcome.sections
                }
            }
        };

        let status = if cancelled { RunStatus::Cancelled } else { RunStatus::Completed };
        let report = assemble_report(total, &processed, sections, status);

        info!(
            report_id = %report.report_id,
            status = ?report.status,
            processed = report.metadata.records_processed,
            skipped = report.metadata.records_skipped,
            degraded = report.metadata.records_degraded,
            findings = report.summary.total_findings,
            sections = report.sections.len(),
            "pipeline_completed"
        );
        Ok(report)
    }

    /// Per-record phase. Stops collecting as soon as `cancel` fires; in-flight
    /// workers are aborted and their records dropped.
    async fn process_records(
        &self,
        records: Vec<TransactionRecord>,
        cancel: &CancellationToken,
    ) -> Vec<ProcessedRecord> {
        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut workers = JoinSet::new();
        let mut completed = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            let permits = Arc::clone(&permits);
            let sanitizer = Arc::clone(&self.sanitizer);
            let analyzer = self.analyzer.clone();
            workers.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok()?;
                Some(process_record(&sanitizer, &analyzer, index, record).await)
            });
        }

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    warn!(completed = completed.len(), "pipeline_cancelled");
                    workers.abort_all();
                    break;
                }
                next = workers.join_next() => match next {
                    Some(Ok(Some(record))) => completed.push(record),
                    Some(Ok(None)) => {}
                    Some(Err(err)) => warn!(error = %err, "record_worker_failed"),
                    None => break,
                },
            }
        }

        completed
    }
}

async fn process_record(
    sanitizer: &Sanitizer,
    analyzer: &RiskAnalyzer,
    index: usize,
    record: TransactionRecord,
) -> ProcessedRecord {
    let sanitized = sanitizer.sanitize(&record);
    // Raw values are not held across the model call.
    drop(record);
    let outcome = analyzer.analyze(&sanitized).await;
    ProcessedRecord { index, sanitized, outcome }
}

fn check_analysis_exhaustion(processed: &[ProcessedRecord]) -> Result<(), PipelineError> {
    let unavailable = processed
        .iter()
        .filter(|r| r.outcome.failure.as_ref().is_some_and(|err| err.is_unavailable()))
        .count();

    if !processed.is_empty() && unavailable == processed.len() {
        warn!(failures = unavailable, "analysis_stage_exhausted");
        return Err(PipelineError::Exhausted {
            stage: PipelineStage::Analysis,
            failures: unavailable,
        });
    }
    Ok(())
}
