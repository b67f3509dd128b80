//! Model-driven risk analyzer

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use sentinelpay_domain::constants::MAX_RATIONALE_CHARS;
use sentinelpay_domain::{
    AnalysisError, FindingSource, RecordWarning, RiskCategory, RiskFinding, SanitizedRecord,
    Severity,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::rules::RuleScreen;
use crate::inference::{GenerationOptions, InferenceGateway, Prompt};
use crate::sanitization::Sanitizer;

const SYSTEM_PROMPT: &str = "You are a PCI-DSS risk analyst reviewing one payment transaction. \
Sensitive values have been replaced by placeholders such as [REDACTED:PAN] or masked tokens \
such as ****1111; never try to reconstruct them. Flag velocity anomalies, merchant \
mismatches, amount outliers, geographic anomalies and sensitive data exposure. Respond with \
a single JSON object and nothing else, in the form \
{\"findings\": [{\"severity\": \"low|medium|high|critical\", \"category\": \
\"velocity_anomaly|merchant_mismatch|amount_outlier|\
geographic_anomaly|sensitive_data_exposure|other\", \
\"rationale\": \"...\"}]}. Return an empty findings array when nothing is risky.";

const PLACEHOLDER_OPEN: &str = "[REDACTED:";

#[derive(Debug, Deserialize)]
struct FindingsPayload {
    findings: Vec<RawFinding>,
}

#[derive(Debug, Deserialize)]
struct RawFinding {
    severity: String,
    category: String,
    #[serde(default)]
    rationale: String,
}

/// Findings for one record, plus the failure that degraded it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub record_id: String,
    /// Model findings in emission order, then rule findings.
    pub findings: Vec<RiskFinding>,
    pub failure: Option<AnalysisError>,
}

impl AnalysisOutcome {
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }

    pub fn warning(&self) -> Option<RecordWarning> {
        self.failure.as_ref().map(|err| RecordWarning {
            record_id: self.record_id.clone(),
            kind: err.warning_kind(),
            message: err.to_string(),
        })
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchAnalysis {
    pub outcomes: Vec<AnalysisOutcome>,
}

impl BatchAnalysis {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn findings(&self) -> impl Iterator<Item = &RiskFinding> {
        self.outcomes.iter().flat_map(|outcome| outcome.findings.iter())
    }

    pub fn warnings(&self) -> Vec<RecordWarning> {
        self.outcomes.iter().filter_map(AnalysisOutcome::warning).collect()
    }
}

/// Risk analyzer service
///
/// Accepts only [`SanitizedRecord`]s, so raw card data cannot reach the
/// model through this type.
#[derive(Clone)]
pub struct RiskAnalyzer {
    gateway: InferenceGateway,
    sanitizer: Arc<Sanitizer>,
    options: GenerationOptions,
    rules: Option<RuleScreen>,
    batch_concurrency: usize,
}

impl RiskAnalyzer {
    pub fn new(
        gateway: InferenceGateway,
        sanitizer: Arc<Sanitizer>,
        options: GenerationOptions,
    ) -> Self {
        Self { gateway, sanitizer, options, rules: None, batch_concurrency: 1 }
    }

    /// Append deterministic rule findings after the model's.
    pub fn with_rules(mut self, rules: RuleScreen) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Records analyzed concurrently by [`analyze_batch`](Self::analyze_batch).
    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    /// Model findings only, with the failure surfaced.
    ///
    /// # Errors
    /// - `AnalysisError::Unparseable` when the output misses the findings
    ///   schema or names an unknown severity
    /// - `AnalysisError::Inference` for timeouts and unavailability
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    pub async fn try_analyze(
        &self,
        record: &SanitizedRecord,
    ) -> Result<Vec<RiskFinding>, AnalysisError> {
        let prompt = Prompt::new(record_prompt(record)).with_system(SYSTEM_PROMPT);
        let payload: FindingsPayload = self.gateway.generate_json(&prompt, &self.options).await?;

        let findings = payload
            .findings
            .into_iter()
            .map(|raw| self.to_finding(record, raw))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(findings = findings.len(), "model_findings_parsed");
        Ok(findings)
    }

    /// Analyze one record. Never fails: a model failure degrades the record
    /// to rule findings only and is reported through
    /// [`AnalysisOutcome::failure`].
    pub async fn analyze(&self, record: &SanitizedRecord) -> AnalysisOutcome {
        let (mut findings, failure) = match self.try_analyze(record).await {
            Ok(findings) => (findings, None),
            Err(err) => (Vec::new(), Some(err)),
        };

        if let Some(rules) = &self.rules {
            findings.extend(rules.screen(record));
        }

        AnalysisOutcome { record_id: record.id.clone(), findings, failure }
    }

    /// Analyze records in order. An empty slice yields an empty batch.
    pub async fn analyze_batch(&self, records: &[SanitizedRecord]) -> BatchAnalysis {
        if records.is_empty() {
            return BatchAnalysis::default();
        }

        let outcomes = stream::iter(records)
            .map(|record| self.analyze(record))
            .buffered(self.batch_concurrency)
            .collect::<Vec<_>>()
            .await;

        BatchAnalysis { outcomes }
    }

    fn to_finding(
        &self,
        record: &SanitizedRecord,
        raw: RawFinding,
    ) -> Result<RiskFinding, AnalysisError> {
        let severity: Severity = raw
            .severity
            .parse()
            .map_err(|_| AnalysisError::Unparseable("finding has an unknown severity".into()))?;
        let category = raw.category.parse().unwrap_or(RiskCategory::Other);

        // Scrub before cutting: a cut PAN falls below the detector's digit floor.
        let scrubbed = self.sanitizer.scrub_text(raw.rationale.trim());

        Ok(RiskFinding {
            record_id: record.id.clone(),
            severity,
            category,
            rationale: truncate_chars(&scrubbed, MAX_RATIONALE_CHARS).to_string(),
            source: FindingSource::Model,
        })
    }
}

/// First `max_chars` characters of `text`, never ending inside a placeholder.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let head = &text[..cut];
    match head.rfind(PLACEHOLDER_OPEN) {
        Some(open) if !head[open..].contains(']') => head[..open].trim_end(),
        _ => head,
    }
}

fn record_prompt(record: &SanitizedRecord) -> String {
    let redacted: Vec<String> = record
        .redactions
        .iter()
        .map(|r| format!("{:?}:{:?}", r.field, r.category).to_lowercase())
        .collect();

    let view = json!({
        "transaction_id": record.id,
        "card": record.pan_token,
        "card_brand": record.card_brand,
        "merchant": record.merchant,
        "description": record.description,
        "amount": record.amount,
        "timestamp": record.timestamp.to_rfc3339(),
        "cardholder": record.cardholder,
        "country": record.country,
        "redacted_fields": redacted,
    });

    format!("Analyze this sanitized transaction for PCI-DSS risk:\n{view:#}")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use sentinelpay_common::resilience::RetryConfig;
    use sentinelpay_domain::InferenceError;

    use super::*;
    use crate::inference::TextGenerator;

    /// Replays canned responses in order and records prompts.
    struct Canned {
        responses: Mutex<Vec<Result<String, InferenceError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Canned {
        fn new(responses: Vec<Result<String, InferenceError>>) -> Arc<Self> {
            Arc::new(Self { responses: Mutex::new(responses), prompts: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(
            &self,
            prompt: &Prompt,
            _options: &GenerationOptions,
        ) -> Result<String, InferenceError> {
            self.prompts.lock().expect("lock").push(prompt.user.clone());
            let mut responses = self.responses.lock().expect("lock");
            if responses.is_empty() {
                Ok(r#"{"findings": []}"#.to_string())
            } else {
                responses.remove(0)
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn analyzer(backend: Arc<Canned>) -> RiskAnalyzer {
        let retry = RetryConfig::builder().max_attempts(1).build().expect("retry config");
        let gateway = InferenceGateway::new(backend, retry);
        let sanitizer = Arc::new(Sanitizer::with_defaults().expect("sanitizer"));
        RiskAnalyzer::new(gateway, sanitizer, GenerationOptions::default())
    }

    fn record(id: &str, amount: f64) -> SanitizedRecord {
        SanitizedRecord {
            id: id.into(),
            pan_token: Some("****1111".into()),
            card_brand: Some("visa".into()),
            merchant: "Corner Cafe".into(),
            description: "coffee".into(),
            amount,
            timestamp: Utc::now(),
            cardholder: None,
            country: Some("US".into()),
            redactions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn keeps_model_emission_order() {
        let backend = Canned::new(vec![Ok(r#"```json
{"findings": [
  {"severity": "low", "category": "velocity_anomaly", "rationale": "three swipes"},
  {"severity": "HIGH", "category": "Merchant Mismatch", "rationale": "cafe selling jewelry"}
]}
```"#
            .to_string())]);

        let findings = analyzer(backend).try_analyze(&record("tx-1", 10.0)).await.expect("parse");

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].category, RiskCategory::VelocityAnomaly);
        assert_eq!(findings[1].severity, Severity::High);
        assert_eq!(findings[1].category, RiskCategory::MerchantMismatch);
        assert!(findings.iter().all(|f| f.record_id == "tx-1"));
    }

    #[tokio::test]
    async fn unknown_category_becomes_other() {
        let backend = Canned::new(vec![Ok(
            r#"{"findings": [{"severity": "medium", "category": "weird", "rationale": "?"}]}"#
                .to_string(),
        )]);

        let findings = analyzer(backend).try_analyze(&record("tx-1", 10.0)).await.expect("parse");
        assert_eq!(findings[0].category, RiskCategory::Other);
    }

    #[tokio::test]
    async fn unknown_severity_is_unparseable() {
        let backend = Canned::new(vec![Ok(
            r#"{"findings": [{"severity": "severe", "category": "other", "rationale": "?"}]}"#
                .to_string(),
        )]);

        let err = analyzer(backend).try_analyze(&record("tx-1", 10.0)).await.expect_err("bad");
        assert!(matches!(err, AnalysisError::Unparseable(_)));
    }

    /// Validates degradation to rule findings.
    ///
    /// Assertions:
    /// - Prose output degrades the record with an unparseable warning.
    /// - Rule findings are still attached.
    #[tokio::test]
    async fn unparseable_output_degrades_to_rules() {
        let backend = Canned::new(vec![Ok("Risk Level: High, looks bad".to_string())]);
        let analyzer = analyzer(backend).with_rules(RuleScreen::new(1000.0));

        let outcome = analyzer.analyze(&record("tx-9", 2500.0)).await;

        assert!(outcome.is_degraded());
        let warning = outcome.warning().expect("warning");
        assert_eq!(warning.kind, sentinelpay_domain::WarningKind::AnalysisUnparseable);
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.findings[0].category, RiskCategory::AmountOutlier);
    }

    #[tokio::test]
    async fn rationale_is_scrubbed() {
        let backend = Canned::new(vec![Ok(r#"{"findings": [{"severity": "critical",
            "category": "sensitive_data_exposure",
            "rationale": "card 4111111111111111 belongs to jane@example.com"}]}"#
            .to_string())]);

        let findings = analyzer(backend).try_analyze(&record("tx-1", 10.0)).await.expect("parse");

        assert!(!findings[0].rationale.contains("4111111111111111"));
        assert!(!findings[0].rationale.contains("jane@example.com"));
    }

    fn rationale_reply(rationale: &str) -> String {
        serde_json::json!({
            "findings": [{"severity": "high", "category": "other", "rationale": rationale}]
        })
        .to_string()
    }

    /// Validates a card number straddling the rationale length limit.
    ///
    /// # Test Steps
    /// 1. The model returns a rationale whose PAN crosses the character limit
    /// 2. Parse the findings
    ///
    /// Assertions:
    /// - No PAN digits survive, not even a prefix cut by the limit
    /// - The rationale does not end in a partial placeholder
    /// - The rationale respects the limit
    #[tokio::test]
    async fn long_rationale_is_scrubbed_before_truncation() {
        let rationale = format!("{} 4111111111111111", "x".repeat(MAX_RATIONALE_CHARS - 12));
        let backend = Canned::new(vec![Ok(rationale_reply(&rationale))]);

        let findings = analyzer(backend).try_analyze(&record("tx-1", 10.0)).await.expect("parse");
        let kept = &findings[0].rationale;

        assert!(!kept.chars().any(|c| c.is_ascii_digit()), "digits leaked: {kept}");
        assert!(!kept.contains('['));
        assert!(kept.chars().count() <= MAX_RATIONALE_CHARS);
        assert!(kept.starts_with("xxx"));
    }

    #[tokio::test]
    async fn placeholder_inside_the_limit_is_kept_whole() {
        let rationale = format!("{} 4111111111111111 tail", "x".repeat(100));
        let backend = Canned::new(vec![Ok(rationale_reply(&rationale))]);

        let findings = analyzer(backend).try_analyze(&record("tx-1", 10.0)).await.expect("parse");

        assert!(findings[0].rationale.ends_with("[REDACTED:PAN] tail"));
    }

    #[test]
    fn truncation_backs_off_to_placeholder_start() {
        assert_eq!(truncate_chars("abc [REDACTED:PAN]", 8), "abc");
        assert_eq!(truncate_chars("abc [REDACTED:PAN] d", 19), "abc [REDACTED:PAN] ");
        assert_eq!(truncate_chars("short", 600), "short");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    #[tokio::test]
    async fn empty_batch_makes_no_calls() {
        let backend = Canned::new(Vec::new());
        let batch = analyzer(backend.clone()).analyze_batch(&[]).await;

        assert!(batch.is_empty());
        assert!(backend.prompts.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let backend = Canned::new(Vec::new());
        let records = vec![record("a", 1.0), record("b", 2.0), record("c", 3.0)];

        let batch =
            analyzer(backend).with_batch_concurrency(3).analyze_batch(&records).await;

        let ids: Vec<_> = batch.outcomes.iter().map(|o| o.record_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(batch.warnings().is_empty());
    }

    #[tokio::test]
    async fn prompt_carries_only_sanitized_fields() {
        let backend = Canned::new(Vec::new());
        analyzer(backend.clone()).analyze(&record("tx-1", 10.0)).await;

        let prompts = backend.prompts.lock().expect("lock");
        assert!(prompts[0].contains("****1111"));
        assert!(prompts[0].contains("\"transaction_id\": \"tx-1\""));
    }
}
