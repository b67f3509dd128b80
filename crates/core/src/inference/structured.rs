//! Extraction of JSON payloads from free-form model output

use once_cell::sync::Lazy;
use regex::Regex;
use sentinelpay_domain::InferenceError;
use serde::de::DeserializeOwned;

static FENCED_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```")
        .expect("FENCED_BLOCK_REGEX should compile - this is a bug")
});

/// Locate the JSON payload in a completion.
///
/// Prefers the first fenced code block; otherwise takes the span from the
/// first `{` to the last `}`.
pub fn extract_json_payload(text: &str) -> Option<&str> {
    if let Some(inner) = FENCED_BLOCK_REGEX.captures(text).and_then(|caps| caps.get(1)) {
        let inner = inner.as_str().trim();
        if !inner.is_empty() {
            return Some(inner);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Extract and deserialize a JSON payload against schema `T`.
///
/// # Errors
/// `InferenceError::Malformed` when no payload is found or it does not match
/// the schema. The error message carries only the position of the failure,
/// never response content.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, InferenceError> {
    let payload = extract_json_payload(text)
        .ok_or_else(|| InferenceError::Malformed("no JSON object in response".to_string()))?;

    serde_json::from_str(payload).map_err(|err| {
        InferenceError::Malformed(format!(
            "response does not match schema ({:?} error at line {}, column {})",
            err.classify(),
            err.line(),
            err.column()
        ))
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        narrative: String,
    }

    #[test]
    fn prefers_fenced_block() {
        let text = "Sure! {not this}\n```json\n{\"narrative\": \"ok\"}\n```\ntrailing }";
        assert_eq!(extract_json_payload(text), Some("{\"narrative\": \"ok\"}"));
    }

    #[test]
    fn falls_back_to_outermost_braces() {
        let text = "Here you go: {\"narrative\": \"a {nested} brace\"} hope it helps";
        let parsed: Payload = parse_json(text).expect("parse");
        assert_eq!(parsed.narrative, "a {nested} brace");
    }

    #[test]
    fn missing_payload_is_malformed() {
        let err = parse_json::<Payload>("Risk Level: High").expect_err("no json");
        assert!(matches!(err, InferenceError::Malformed(_)));
    }

    /// Validates that schema errors never echo response content.
    ///
    /// Assertions:
    /// - A wrong-typed field yields `Malformed`.
    /// - The message does not contain the offending value.
    #[test]
    fn schema_errors_do_not_leak_content() {
        let err = parse_json::<Payload>(r#"{"narrative": 4111111111111111}"#).expect_err("type");
        match err {
            InferenceError::Malformed(message) => assert!(!message.contains("4111")),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }
}
