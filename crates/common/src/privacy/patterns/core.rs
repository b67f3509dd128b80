// Core PAN/PII pattern detection and redaction

use once_cell::sync::Lazy;
use regex::Regex;

use super::card::{card_brand, digits_of, luhn_check};
use super::config::DetectorConfig;
use super::error::PiiResult;
use super::types::{DetectionMethod, PiiEntity, PiiType};

/// Compiled regex patterns for efficient reuse
pub(crate) const EMAIL_PATTERN: &str = r"(?u)\b[\p{L}\p{N}._%+-]+@[\p{L}\p{N}.-]+\.[\p{L}]{2,}\b";

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_REGEX should compile - this is a bug"));

// Group 1 is the name itself; the keyword or honorific stays readable.
static NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\b(?i:name|cardholder|card\s+holder|customer|holder|from)\b\s*[:=]?\s*|\b(?:Mr|Mrs|Ms|Miss|Dr)\.?\s+)([A-Z][a-z]+(?:[ '-][A-Z][a-z]+){0,2})",
    )
    .expect("NAME_REGEX should compile - this is a bug")
});

static ADDRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b\d{1,5}\s+(?:[A-Z][a-z]+\.?\s+){1,4}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl|Terrace|Parkway)\b\.?",
    )
    .expect("ADDRESS_REGEX should compile - this is a bug")
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[ .-]?)?(?:\(\d{3}\)[ .-]?|\b\d{3}[ .-])\d{3}[ .-]\d{4}\b")
        .expect("PHONE_REGEX should compile - this is a bug")
});

static CVV_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:cvv2?|cvc2?|cid|csc|security\s+code)\b\s*[:=#]?\s*(\d{3,4})\b")
        .expect("CVV_REGEX should compile - this is a bug")
});

static EXPIRY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:exp(?:iry|iration)?(?:\s+date)?|expires?|valid\s+thru)\b\s*[:=]?\s*((?:0[1-9]|1[0-2])\s*/\s*(?:\d{4}|\d{2}))\b",
    )
    .expect("EXPIRY_REGEX should compile - this is a bug")
});

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[REDACTED:([A-Z]+)\]$")
        .expect("PLACEHOLDER_REGEX should compile - this is a bug")
});

const PAN_WINDOW: usize = 16;
// Each pass only shrinks the unredacted portion of the text; the bound is a
// backstop, a second pass is already rare.
const MAX_REDACTION_PASSES: usize = 8;

/// Fixed-width placeholder for a category, e.g. `[REDACTED:EMAIL]`.
pub fn placeholder(kind: PiiType) -> String {
    format!("[REDACTED:{}]", kind.label())
}

/// Whether `text` is exactly one redaction placeholder.
pub fn is_placeholder(text: &str) -> bool {
    PLACEHOLDER_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .is_some_and(|label| PiiType::from_label(label.as_str()).is_some())
}

/// Result of redacting a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Redacted {
    /// Text with every detected span replaced by its placeholder.
    pub text: String,
    /// Categories that were redacted, in order of first appearance.
    pub categories: Vec<PiiType>,
}

impl Redacted {
    pub fn was_redacted(&self) -> bool {
        !self.categories.is_empty()
    }
}

/// Synchronous PAN/PII detector.
///
/// Detection is pure and total: it never fails and never calls out of
/// process. Overlapping candidates are resolved longest-first with a
/// leftmost tie-break, so every byte of input belongs to at most one entity.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    config: DetectorConfig,
    numeric: Regex,
}

impl PatternMatcher {
    /// Build a matcher from a validated configuration.
    pub fn new(config: DetectorConfig) -> PiiResult<Self> {
        config.validate()?;
        // A digit run with single space or dash separators.
        let numeric = Regex::new(&format!(r"\d(?:[ -]?\d){{{},}}", config.pan_min_digits - 1))?;
        Ok(Self { config, numeric })
    }

    pub fn with_defaults() -> PiiResult<Self> {
        Self::new(DetectorConfig::default())
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect sensitive spans, resolved so that no two overlap. Sorted by
    /// start position.
    pub fn detect(&self, text: &str) -> Vec<PiiEntity> {
        if text.is_empty() {
            return Vec::new();
        }
        resolve_overlaps(self.detect_candidates(text))
    }

    /// True when nothing in `text` matches any enabled detector.
    pub fn is_clean(&self, text: &str) -> bool {
        self.detect(text).is_empty()
    }

    /// Replace every detected span with its placeholder.
    ///
    /// Redaction is repeated until the text is clean, which makes it
    /// idempotent: `redact(redact(t).text).text == redact(t).text`.
    pub fn redact(&self, text: &str) -> Redacted {
        let mut current = text.to_string();
        let mut categories: Vec<PiiType> = Vec::new();

        for _ in 0..MAX_REDACTION_PASSES {
            let entities = self.detect(&current);
            if entities.is_empty() {
                break;
            }

            // Replace in reverse order to preserve byte offsets
            for entity in entities.iter().rev() {
                current.replace_range(
                    entity.start_position..entity.end_position,
                    &placeholder(entity.entity_type),
                );
            }

            for entity in &entities {
                if !categories.contains(&entity.entity_type) {
                    categories.push(entity.entity_type);
                }
            }
        }

        Redacted { text: current, categories }
    }

    /// Classify a bare digit string as a card number.
    ///
    /// Returns the detection method when the digits should be treated as a
    /// PAN: Luhn-valid or a known issuer prefix within the configured bounds,
    /// a Luhn-valid 16-digit window inside a longer run, or any run longer
    /// than the configured maximum (unrecognized format).
    pub fn classify_digits(&self, digits: &str) -> Option<DetectionMethod> {
        let len = digits.len();
        if len < self.config.pan_min_digits {
            return None;
        }
        if len > self.config.pan_max_digits {
            return Some(DetectionMethod::Regex);
        }
        if luhn_check(digits) || card_brand(digits).is_some() {
            return Some(DetectionMethod::ChecksumValidation);
        }
        if len > PAN_WINDOW {
            let has_valid_window = (0..=len - PAN_WINDOW)
                .filter_map(|start| digits.get(start..start + PAN_WINDOW))
                .any(luhn_check);
            if has_valid_window {
                return Some(DetectionMethod::ChecksumValidation);
            }
        }
        None
    }

    fn detect_candidates(&self, text: &str) -> Vec<PiiEntity> {
        let mut candidates = Vec::new();

        for m in self.numeric.find_iter(text) {
            if let Some(method) = self.classify_digits(&digits_of(m.as_str())) {
                candidates.push(PiiEntity::new(PiiType::Pan, m.start(), m.end(), method));
            }
        }

        if self.config.is_enabled(PiiType::Email) {
            push_matches(&EMAIL_REGEX, text, PiiType::Email, &mut candidates);
        }
        if self.config.is_enabled(PiiType::Name) {
            push_captures(&NAME_REGEX, text, PiiType::Name, &mut candidates);
        }
        if self.config.is_enabled(PiiType::Address) {
            push_matches(&ADDRESS_REGEX, text, PiiType::Address, &mut candidates);
        }
        if self.config.is_enabled(PiiType::Phone) {
            push_matches(&PHONE_REGEX, text, PiiType::Phone, &mut candidates);
        }
        if self.config.detect_authentication_data {
            push_captures(&CVV_REGEX, text, PiiType::Cvv, &mut candidates);
            push_captures(&EXPIRY_REGEX, text, PiiType::Expiry, &mut candidates);
        }

        candidates
    }
}

fn push_matches(regex: &Regex, text: &str, kind: PiiType, out: &mut Vec<PiiEntity>) {
    out.extend(
        regex
            .find_iter(text)
            .map(|m| PiiEntity::new(kind, m.start(), m.end(), DetectionMethod::Regex)),
    );
}

// Keyword-anchored detectors redact only the captured value.
fn push_captures(regex: &Regex, text: &str, kind: PiiType, out: &mut Vec<PiiEntity>) {
    out.extend(regex.captures_iter(text).filter_map(|caps| caps.get(1)).map(|m| {
        PiiEntity::new(kind, m.start(), m.end(), DetectionMethod::ContextualAnalysis)
    }));
}

/// Longest match wins; equal lengths go to the leftmost span.
fn resolve_overlaps(mut candidates: Vec<PiiEntity>) -> Vec<PiiEntity> {
    candidates.sort_by(|a, b| {
        b.length().cmp(&a.length()).then_with(|| a.start_position.cmp(&b.start_position))
    });

    let mut accepted: Vec<PiiEntity> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if accepted.iter().all(|kept| !kept.overlaps_with(&candidate)) {
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|entity| entity.start_position);
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PatternMatcher {
        PatternMatcher::with_defaults().expect("default matcher")
    }

    fn kinds(entities: &[PiiEntity]) -> Vec<PiiType> {
        entities.iter().map(|entity| entity.entity_type).collect()
    }

    /// Validates `PatternMatcher::detect` for separated and contiguous PANs.
    ///
    /// Assertions:
    /// - Space- and dash-separated Luhn-valid numbers are detected.
    /// - The span covers the separators.
    #[test]
    fn detects_separated_card_numbers() {
        let text = "paid with 4111 1111 1111 1111 and 5555-5555-5555-4444";
        let entities = matcher().detect(text);

        assert_eq!(kinds(&entities), vec![PiiType::Pan, PiiType::Pan]);
        let span = &text[entities[0].start_position..entities[0].end_position];
        assert_eq!(span, "4111 1111 1111 1111");
        assert_eq!(
            &text[entities[1].start_position..entities[1].end_position],
            "5555-5555-5555-4444"
        );
    }

    #[test]
    fn ignores_short_or_invalid_digit_runs() {
        let m = matcher();
        assert!(m.is_clean("order 123456 on 2024-01-15 for 1500.00"));
        // 16 digits, no issuer prefix, bad checksum
        assert!(m.is_clean("ref 1234567890123450"));
    }

    /// Validates that runs longer than a PAN are redacted as unrecognized.
    ///
    /// Assertions:
    /// - A 22-digit run is detected even though it fails Luhn.
    /// - A 17-digit run hiding a Luhn-valid 16-digit window is detected.
    #[test]
    fn flags_overlong_runs_and_embedded_windows() {
        let m = matcher();
        assert_eq!(kinds(&m.detect("acct 1234567890123456789012")), vec![PiiType::Pan]);
        assert_eq!(
            m.classify_digits("94111111111111111"),
            Some(DetectionMethod::ChecksumValidation)
        );
    }

    #[test]
    fn detects_contextual_pii() {
        let text = "Cardholder: John Smith, email john.smith@example.com, call +1-415-555-2671, \
                    ship to 42 Elm Street";
        let entities = matcher().detect(text);

        assert_eq!(
            kinds(&entities),
            vec![PiiType::Name, PiiType::Email, PiiType::Phone, PiiType::Address]
        );
        let name = &entities[0];
        assert_eq!(&text[name.start_position..name.end_position], "John Smith");
        assert_eq!(name.detection_method, DetectionMethod::ContextualAnalysis);
    }

    #[test]
    fn detects_authentication_data_after_keywords() {
        let text = "CVV: 123 exp 09/27";
        let redacted = matcher().redact(text);

        assert_eq!(redacted.text, "CVV: [REDACTED:CVV] exp [REDACTED:EXPIRY]");
        assert_eq!(redacted.categories, vec![PiiType::Cvv, PiiType::Expiry]);
    }

    /// Validates overlap resolution picks the longest span.
    ///
    /// Assertions:
    /// - An email whose local part is a card number becomes one EMAIL
    ///   placeholder.
    #[test]
    fn longest_overlapping_match_wins() {
        let text = "contact 4111111111111111@cards.example.com";
        let redacted = matcher().redact(text);

        assert_eq!(redacted.text, "contact [REDACTED:EMAIL]");
        assert_eq!(redacted.categories, vec![PiiType::Email]);
    }

    #[test]
    fn leftmost_wins_on_equal_length() {
        let resolved = resolve_overlaps(vec![
            PiiEntity::new(PiiType::Phone, 4, 10, DetectionMethod::Regex),
            PiiEntity::new(PiiType::Pan, 2, 8, DetectionMethod::Regex),
        ]);
        assert_eq!(kinds(&resolved), vec![PiiType::Pan]);
    }

    #[test]
    fn redaction_is_idempotent() {
        let m = matcher();
        let text = "Mr. Alan Turing paid 4111-1111-1111-1111 from alan@example.org CVC 9876";
        let once = m.redact(text);
        let twice = m.redact(&once.text);

        assert_eq!(once.text, twice.text);
        assert!(!twice.was_redacted());
        assert!(m.is_clean(&once.text));
    }

    #[test]
    fn disabled_detectors_are_skipped() {
        let config = DetectorConfig { detect_emails: false, ..DetectorConfig::default() };
        let m = PatternMatcher::new(config).expect("matcher");
        assert!(m.is_clean("reach me at someone@example.com"));
    }

    #[test]
    fn recognises_placeholders() {
        assert!(is_placeholder("[REDACTED:PAN]"));
        assert!(is_placeholder(&placeholder(PiiType::Expiry)));
        assert!(!is_placeholder("[REDACTED:SSN]"));
        assert!(!is_placeholder("x [REDACTED:PAN]"));
    }
}
