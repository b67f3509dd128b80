//! Shared test helpers for `sentinelpay-core` integration tests.
//!
//! Provides a scripted text generator and record fixtures so pipeline tests
//! can focus on behaviour instead of wiring.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sentinelpay_common::privacy::patterns::{digits_of, luhn_check};
use sentinelpay_core::{GenerationOptions, PipelineOrchestrator, Prompt, TextGenerator};
use sentinelpay_domain::constants::DEFAULT_COMPLIANCE_MODEL;
use sentinelpay_domain::{InferenceError, SentinelConfig, TransactionRecord};
use tokio_util::sync::CancellationToken;

pub const ANALYSIS_FINDINGS: &str = r#"{"findings": [
    {"severity": "medium", "category": "velocity_anomaly", "rationale": "Repeated charges within minutes"}
]}"#;

pub const EXPLANATION: &str = r#"Here is the section:
```json
{"narrative": "Transactions were flagged during log review.", "remediation": "Review and document each flagged transaction."}
```"#;

static DIGIT_RUN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d(?:[ -]?\d)*").expect("DIGIT_RUN_REGEX should compile"));

/// Text generator that answers by stage.
///
/// Explanation calls are recognised by the compliance model name; every
/// other call is treated as analysis. Optionally cancels a token on the
/// N-th call and then stalls, simulating an operator abort mid-batch.
pub struct ScriptedGenerator {
    analysis: Result<String, InferenceError>,
    explanation: Result<String, InferenceError>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    cancel_on: Option<(usize, CancellationToken)>,
}

impl ScriptedGenerator {
    pub fn new(
        analysis: Result<String, InferenceError>,
        explanation: Result<String, InferenceError>,
    ) -> Self {
        Self {
            analysis,
            explanation,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            cancel_on: None,
        }
    }

    /// One medium finding per record and a valid explanation.
    pub fn healthy() -> Self {
        Self::new(Ok(ANALYSIS_FINDINGS.to_string()), Ok(EXPLANATION.to_string()))
    }

    pub fn unavailable() -> Self {
        let down = Err(InferenceError::unavailable("connection refused"));
        Self::new(down.clone(), down)
    }

    pub fn cancel_on_call(mut self, call: usize, token: CancellationToken) -> Self {
        self.cancel_on = Some((call, token));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<String, InferenceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.user.clone());

        if let Some((cancel_call, token)) = &self.cancel_on {
            if call == *cancel_call {
                token.cancel();
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        }

        if options.model.as_deref() == Some(DEFAULT_COMPLIANCE_MODEL) {
            self.explanation.clone()
        } else {
            self.analysis.clone()
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Default configuration with fast retries and short timeouts.
pub fn fast_config(max_concurrency: usize) -> SentinelConfig {
    let mut config = SentinelConfig::default();
    config.inference.max_attempts = 2;
    config.inference.base_backoff_ms = 1;
    config.inference.timeout_ms = 5_000;
    config.pipeline.max_concurrency = max_concurrency;
    config
}

pub fn orchestrator(
    backend: Arc<ScriptedGenerator>,
    max_concurrency: usize,
) -> PipelineOrchestrator {
    PipelineOrchestrator::from_config(backend, &fast_config(max_concurrency)).unwrap()
}

pub fn record(id: &str) -> TransactionRecord {
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
    TransactionRecord::new(id, "Corner Cafe", 12.5, ts).with_description("coffee and pastry")
}

pub fn records(count: usize) -> Vec<TransactionRecord> {
    (1..=count).map(|i| record(&format!("tx-{i}"))).collect()
}

/// Every 16-digit window of every digit run in `text` that passes Luhn.
pub fn luhn_valid_windows(text: &str) -> Vec<String> {
    DIGIT_RUN_REGEX
        .find_iter(text)
        .map(|m| digits_of(m.as_str()))
        .filter(|digits| digits.len() >= 16)
        .flat_map(|digits| {
            (0..=digits.len() - 16)
                .map(|start| digits[start..start + 16].to_string())
                .filter(|window| luhn_check(window))
                .collect::<Vec<_>>()
        })
        .collect()
}
