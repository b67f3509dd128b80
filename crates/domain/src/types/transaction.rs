//! Transaction records before and after sanitization

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Where a transaction took place, as reported by the acquiring log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Raw transaction as ingested from a card-transaction log.
///
/// Holds unredacted cardholder data. Never logged, never sent to inference,
/// and never written to a report; only [`SanitizedRecord`] leaves the
/// sanitization stage.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(alias = "transaction_id")]
    pub id: String,
    /// PAN-like numeric string. Log lines without card data carry none.
    #[serde(default, alias = "card_number")]
    pub pan: Option<String>,
    #[serde(default, alias = "merchant_details")]
    pub merchant: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "transaction_amount")]
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub cardholder_name: Option<String>,
    /// Card verification value. Its mere presence in a log is a violation.
    #[serde(default)]
    pub cvv: Option<String>,
    #[serde(default, alias = "location_data")]
    pub location: Option<Location>,
}

// Only the identifier is safe to print.
impl fmt::Debug for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionRecord")
            .field("id", &self.id)
            .field("pan", &self.pan.as_ref().map(|_| "<raw>"))
            .finish_non_exhaustive()
    }
}

impl TransactionRecord {
    /// Minimal record with required fields only.
    pub fn new(
        id: impl Into<String>,
        merchant: impl Into<String>,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            pan: None,
            merchant: merchant.into(),
            description: String::new(),
            amount,
            timestamp,
            cardholder_name: None,
            cvv: None,
            location: None,
        }
    }

    pub fn with_pan(mut self, pan: impl Into<String>) -> Self {
        self.pan = Some(pan.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_cardholder(mut self, name: impl Into<String>) -> Self {
        self.cardholder_name = Some(name.into());
        self
    }

    pub fn with_cvv(mut self, cvv: impl Into<String>) -> Self {
        self.cvv = Some(cvv.into());
        self
    }

    pub fn with_location(mut self, city: Option<String>, country: Option<String>) -> Self {
        self.location = Some(Location { city, country });
        self
    }
}

/// Accepts RFC 3339 timestamps as well as offset-less ISO 8601 ones
/// (interpreted as UTC), which is what simulated logs emit.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid timestamp '{raw}', expected ISO 8601"))
    })
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Record field a redaction was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Id,
    Pan,
    Merchant,
    Description,
    Cardholder,
    Cvv,
    City,
    Country,
}

/// Category of a redacted value, used in `[REDACTED:<CATEGORY>]`
/// placeholders and the redaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitiveCategory {
    Pan,
    Email,
    Name,
    Address,
    Phone,
    Cvv,
    Expiry,
    Location,
}

impl SensitiveCategory {
    /// Sensitive authentication data under PCI DSS.
    pub fn is_authentication_data(self) -> bool {
        matches!(self, Self::Cvv | Self::Expiry)
    }
}

/// One entry of the redaction log: which field, which category. Never the
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Redaction {
    pub field: RecordField,
    pub category: SensitiveCategory,
}

impl Redaction {
    pub fn new(field: RecordField, category: SensitiveCategory) -> Self {
        Self { field, category }
    }
}

/// Transaction with every sensitive value removed.
///
/// The PAN survives only as a masked token (`****1111`) or the full
/// placeholder `[REDACTED:PAN]`; free text carries placeholders in place of
/// detected spans; the city is dropped. No field references the raw record
/// beyond its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedRecord {
    pub id: String,
    pub pan_token: Option<String>,
    pub card_brand: Option<String>,
    pub merchant: String,
    pub description: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub cardholder: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub redactions: Vec<Redaction>,
}

impl SanitizedRecord {
    /// True when sanitization changed anything in the source record.
    pub fn was_redacted(&self) -> bool {
        !self.redactions.is_empty()
    }

    pub fn has_redaction(&self, category: SensitiveCategory) -> bool {
        self.redactions.iter().any(|r| r.category == category)
    }

    pub fn has_redaction_in(&self, field: RecordField, category: SensitiveCategory) -> bool {
        self.redactions.iter().any(|r| r.field == field && r.category == category)
    }
}
