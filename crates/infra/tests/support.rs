//! Shared fixtures for infra integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use sentinelpay_domain::constants::{DEFAULT_COMPLIANCE_MODEL, DEFAULT_RISK_MODEL};
use sentinelpay_domain::{SentinelConfig, TransactionRecord};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const RAW_PAN: &str = "4111111111111111";
pub const RAW_EMAIL: &str = "alice@example.com";

pub const ANALYSIS: &str = r#"{"findings": [{
    "severity": "high",
    "category": "geographic_anomaly",
    "rationale": "Card used in two countries within minutes"
}]}"#;

pub const EXPLANATION: &str = r#"{
    "narrative": "Cross-border activity was flagged.",
    "remediation": "Confirm with the cardholder."
}"#;

pub fn chat_body(content: &str) -> Value {
    json!({
        "model": "stub",
        "created_at": "2024-06-01T09:30:00Z",
        "message": {"role": "assistant", "content": content},
        "done": true
    })
}

/// Mount chat responses routed by the model named in the request.
pub async fn mount_models(server: &MockServer, analysis: &str, explanation: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": DEFAULT_RISK_MODEL})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(analysis)))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": DEFAULT_COMPLIANCE_MODEL})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(explanation)))
        .mount(server)
        .await;
}

pub fn config_for(server: &MockServer) -> SentinelConfig {
    let mut config = SentinelConfig::default();
    config.inference.base_url = server.uri();
    config.inference.max_attempts = 2;
    config.inference.base_backoff_ms = 1;
    config.inference.timeout_ms = 5_000;
    config
}

pub fn record(id: &str) -> TransactionRecord {
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap();
    TransactionRecord::new(id, "Atlas Airlines", 420.0, ts).with_description("seat upgrade")
}

pub fn sample_records() -> Vec<TransactionRecord> {
    vec![
        record("tx-1").with_pan(RAW_PAN).with_cardholder("Alice Anderson"),
        record("tx-2").with_description(format!("receipt sent to {RAW_EMAIL}")),
        record("tx-3").with_cvv("123").with_location(Some("Tokyo".into()), Some("Japan".into())),
    ]
}
