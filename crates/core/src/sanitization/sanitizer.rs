//! Record sanitizer - PAN masking and PII redaction

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sentinelpay_common::privacy::patterns::{
    card_brand, digits_of, is_placeholder, luhn_check, placeholder, DetectorConfig,
    PatternMatcher, PiiType,
};
use sentinelpay_domain::{
    RecordField, Redaction, SanitizedRecord, SanitizerConfig, SentinelError, SensitiveCategory,
    TransactionRecord,
};
use tracing::debug;

// Output of a previous masking pass: four stars and up to four digits.
static MASKED_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*{4}\d{0,4}$").expect("MASKED_TOKEN_REGEX should compile - this is a bug")
});

const MASK: &str = "****";

/// Borrowed view over the fields the sanitizer reads.
///
/// Both raw and already-sanitized records expose one, which is what lets
/// sanitization run twice without changing the result.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    pub id: &'a str,
    pub pan: Option<&'a str>,
    pub merchant: &'a str,
    pub description: &'a str,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub cardholder: Option<&'a str>,
    pub cvv_present: bool,
    pub city: Option<&'a str>,
    pub country: Option<&'a str>,
    /// Brand recorded by an earlier pass, kept when the PAN is already masked.
    pub card_brand: Option<&'a str>,
    pub prior_redactions: &'a [Redaction],
}

/// Anything the sanitizer accepts.
pub trait Sanitizable {
    fn view(&self) -> RecordView<'_>;
}

impl Sanitizable for TransactionRecord {
    fn view(&self) -> RecordView<'_> {
        let location = self.location.as_ref();
        RecordView {
            id: &self.id,
            pan: self.pan.as_deref(),
            merchant: &self.merchant,
            description: &self.description,
            amount: self.amount,
            timestamp: self.timestamp,
            cardholder: self.cardholder_name.as_deref(),
            cvv_present: self.cvv.as_deref().is_some_and(|cvv| !cvv.trim().is_empty()),
            city: location.and_then(|loc| loc.city.as_deref()),
            country: location.and_then(|loc| loc.country.as_deref()),
            card_brand: None,
            prior_redactions: &[],
        }
    }
}

impl Sanitizable for SanitizedRecord {
    fn view(&self) -> RecordView<'_> {
        RecordView {
            id: &self.id,
            pan: self.pan_token.as_deref(),
            merchant: &self.merchant,
            description: &self.description,
            amount: self.amount,
            timestamp: self.timestamp,
            cardholder: self.cardholder.as_deref(),
            cvv_present: false,
            city: None,
            country: self.country.as_deref(),
            card_brand: self.card_brand.as_deref(),
            prior_redactions: &self.redactions,
        }
    }
}

/// Deterministic, in-process sanitizer.
///
/// `sanitize` is total: every input yields a record, unrecognized PAN
/// formats are fully redacted rather than rejected, and nothing here
/// suspends or leaves the process.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    matcher: PatternMatcher,
    visible_suffix_digits: usize,
}

impl Sanitizer {
    /// # Errors
    /// Returns `SentinelError::Config` for digit bounds the detector rejects
    /// or a visible suffix longer than four digits.
    pub fn new(config: &SanitizerConfig) -> Result<Self, SentinelError> {
        if config.visible_suffix_digits > 4 {
            return Err(SentinelError::Config(format!(
                "visible_suffix_digits must not exceed 4, got {}",
                config.visible_suffix_digits
            )));
        }

        let detector = DetectorConfig {
            pan_min_digits: config.pan_min_digits,
            pan_max_digits: config.pan_max_digits,
            detect_emails: config.detect_emails,
            detect_names: config.detect_names,
            detect_addresses: config.detect_addresses,
            detect_phones: config.detect_phones,
            detect_authentication_data: config.detect_authentication_data,
        };
        let matcher =
            PatternMatcher::new(detector).map_err(|err| SentinelError::Config(err.to_string()))?;

        Ok(Self { matcher, visible_suffix_digits: config.visible_suffix_digits })
    }

    pub fn with_defaults() -> Result<Self, SentinelError> {
        Self::new(&SanitizerConfig::default())
    }

    /// Sanitize one record.
    pub fn sanitize<R: Sanitizable + ?Sized>(&self, record: &R) -> SanitizedRecord {
        let view = record.view();
        let mut log = RedactionLog::new(view.prior_redactions);

        let (pan_token, card_brand) = self.mask_pan(view.pan, view.card_brand, &mut log);
        let id = self.scrub_field(view.id, RecordField::Id, &mut log);
        let merchant = self.scrub_field(view.merchant, RecordField::Merchant, &mut log);
        let description = self.scrub_field(view.description, RecordField::Description, &mut log);
        let country = non_empty(view.country)
            .map(|country| self.scrub_field(country, RecordField::Country, &mut log));

        let cardholder = non_empty(view.cardholder).map(|name| {
            if is_placeholder(name) {
                name.to_string()
            } else {
                log.push(RecordField::Cardholder, SensitiveCategory::Name);
                placeholder(PiiType::Name)
            }
        });

        if view.cvv_present {
            log.push(RecordField::Cvv, SensitiveCategory::Cvv);
        }
        if non_empty(view.city).is_some() {
            log.push(RecordField::City, SensitiveCategory::Location);
        }

        let sanitized = SanitizedRecord {
            id,
            pan_token,
            card_brand,
            merchant,
            description,
            amount: view.amount,
            timestamp: view.timestamp,
            cardholder,
            country,
            redactions: log.into_entries(),
        };

        debug!(
            record_id = %sanitized.id,
            redactions = sanitized.redactions.len(),
            "record_sanitized"
        );
        sanitized
    }

    /// Redact PAN/PII-shaped spans from arbitrary text, including
    /// model-generated output.
    pub fn scrub_text(&self, text: &str) -> String {
        self.matcher.redact(text).text
    }

    pub fn is_clean(&self, text: &str) -> bool {
        self.matcher.is_clean(text)
    }

    fn scrub_field(&self, text: &str, field: RecordField, log: &mut RedactionLog) -> String {
        let redacted = self.matcher.redact(text);
        for kind in &redacted.categories {
            log.push(field, category_of(*kind));
        }
        redacted.text
    }

    fn mask_pan(
        &self,
        pan: Option<&str>,
        prior_brand: Option<&str>,
        log: &mut RedactionLog,
    ) -> (Option<String>, Option<String>) {
        let Some(pan) = non_empty(pan) else {
            return (None, None);
        };

        if is_placeholder(pan) || MASKED_TOKEN_REGEX.is_match(pan) {
            return (Some(pan.to_string()), prior_brand.map(str::to_string));
        }

        log.push(RecordField::Pan, SensitiveCategory::Pan);

        let digits = digits_of(pan);
        let well_formed = pan.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
            && (self.matcher.config().pan_min_digits..=self.matcher.config().pan_max_digits)
                .contains(&digits.len());
        let brand = card_brand(&digits);

        if well_formed && (luhn_check(&digits) || brand.is_some()) {
            let suffix = &digits[digits.len() - self.visible_suffix_digits..];
            (Some(format!("{MASK}{suffix}")), brand.map(|b| b.as_str().to_string()))
        } else {
            (Some(placeholder(PiiType::Pan)), None)
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn category_of(kind: PiiType) -> SensitiveCategory {
    match kind {
        PiiType::Pan => SensitiveCategory::Pan,
        PiiType::Email => SensitiveCategory::Email,
        PiiType::Name => SensitiveCategory::Name,
        PiiType::Address => SensitiveCategory::Address,
        PiiType::Phone => SensitiveCategory::Phone,
        PiiType::Cvv => SensitiveCategory::Cvv,
        PiiType::Expiry => SensitiveCategory::Expiry,
    }
}

/// Redaction log that keeps prior entries first and drops duplicates.
struct RedactionLog {
    entries: Vec<Redaction>,
}

impl RedactionLog {
    fn new(prior: &[Redaction]) -> Self {
        let mut log = Self { entries: Vec::with_capacity(prior.len()) };
        for entry in prior {
            log.push(entry.field, entry.category);
        }
        log
    }

    fn push(&mut self, field: RecordField, category: SensitiveCategory) {
        let entry = Redaction::new(field, category);
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }

    fn into_entries(self) -> Vec<Redaction> {
        self.entries
    }
}
