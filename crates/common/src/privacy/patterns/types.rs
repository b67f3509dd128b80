use std::fmt;

use serde::{Deserialize, Serialize};

/// Categories of sensitive data recognised by the pattern matcher.
///
/// The `Display` form is the category label embedded in redaction
/// placeholders, e.g. `[REDACTED:PAN]`.
///
/// # Examples
/// ```
/// use sentinelpay_common::privacy::patterns::types::PiiType;
///
/// assert_eq!(PiiType::Pan.to_string(), "PAN");
/// assert!(PiiType::Cvv.is_authentication_data());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiType {
    /// Primary account number (card number).
    Pan,
    Email,
    /// Person name found next to a context keyword or honorific.
    Name,
    /// Street address.
    Address,
    Phone,
    /// Card verification value following a CVV/CVC keyword.
    Cvv,
    /// Card expiry date following an expiry keyword.
    Expiry,
}

impl PiiType {
    /// Every category, in detector order.
    pub const ALL: [PiiType; 7] = [
        PiiType::Pan,
        PiiType::Email,
        PiiType::Name,
        PiiType::Address,
        PiiType::Phone,
        PiiType::Cvv,
        PiiType::Expiry,
    ];

    /// Placeholder label for this category.
    pub fn label(self) -> &'static str {
        match self {
            PiiType::Pan => "PAN",
            PiiType::Email => "EMAIL",
            PiiType::Name => "NAME",
            PiiType::Address => "ADDRESS",
            PiiType::Phone => "PHONE",
            PiiType::Cvv => "CVV",
            PiiType::Expiry => "EXPIRY",
        }
    }

    /// Parse a placeholder label back into a category.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }

    /// Sensitive authentication data (must never be stored after
    /// authorization).
    pub fn is_authentication_data(self) -> bool {
        matches!(self, PiiType::Cvv | PiiType::Expiry)
    }
}

impl fmt::Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How an entity was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    /// Plain pattern match.
    Regex,
    /// Pattern match confirmed by a checksum or issuer prefix.
    ChecksumValidation,
    /// Pattern match anchored on a context keyword.
    ContextualAnalysis,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex => write!(f, "Regex"),
            Self::ChecksumValidation => write!(f, "Checksum Validation"),
            Self::ContextualAnalysis => write!(f, "Contextual Analysis"),
        }
    }
}

/// A detected span of sensitive data.
///
/// Positions are byte offsets into the scanned text. The matched value is
/// never retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiEntity {
    pub entity_type: PiiType,
    pub start_position: usize,
    pub end_position: usize,
    pub detection_method: DetectionMethod,
}

impl PiiEntity {
    pub fn new(
        entity_type: PiiType,
        start_position: usize,
        end_position: usize,
        detection_method: DetectionMethod,
    ) -> Self {
        Self { entity_type, start_position, end_position, detection_method }
    }

    /// Returns the length of the detected entity in bytes
    pub fn length(&self) -> usize {
        self.end_position.saturating_sub(self.start_position)
    }

    /// Checks if this entity overlaps with another entity
    pub fn overlaps_with(&self, other: &PiiEntity) -> bool {
        !(self.end_position <= other.start_position || other.end_position <= self.start_position)
    }
}
