use serde::{Deserialize, Serialize};

use super::error::{PiiError, PiiResult};
use super::types::PiiType;

/// Smallest digit count the numeric-sequence detector accepts as a lower
/// bound. Anything shorter collides with dates, amounts and phone numbers.
pub const MIN_PAN_DIGITS_FLOOR: usize = 12;
/// Longest PAN defined by ISO/IEC 7812.
pub const MAX_PAN_DIGITS: usize = 19;

/// Detector configuration for [`PatternMatcher`](super::PatternMatcher).
///
/// PAN detection cannot be disabled; the remaining detectors can be toggled
/// individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum digit count for a numeric run to be considered a PAN
    /// candidate.
    pub pan_min_digits: usize,
    /// Longest digit count treated as a well-formed PAN. Longer runs are
    /// redacted as unrecognized.
    pub pan_max_digits: usize,
    pub detect_emails: bool,
    pub detect_names: bool,
    pub detect_addresses: bool,
    pub detect_phones: bool,
    /// CVV and expiry values following a keyword.
    pub detect_authentication_data: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            pan_min_digits: 13,
            pan_max_digits: MAX_PAN_DIGITS,
            detect_emails: true,
            detect_names: true,
            detect_addresses: true,
            detect_phones: true,
            detect_authentication_data: true,
        }
    }
}

impl DetectorConfig {
    /// Validate digit bounds.
    pub fn validate(&self) -> PiiResult<()> {
        if self.pan_min_digits < MIN_PAN_DIGITS_FLOOR {
            return Err(PiiError::Configuration(format!(
                "pan_min_digits must be at least {MIN_PAN_DIGITS_FLOOR}, got {}",
                self.pan_min_digits
            )));
        }
        if self.pan_max_digits > MAX_PAN_DIGITS {
            return Err(PiiError::Configuration(format!(
                "pan_max_digits must not exceed {MAX_PAN_DIGITS}, got {}",
                self.pan_max_digits
            )));
        }
        if self.pan_min_digits > self.pan_max_digits {
            return Err(PiiError::Configuration(format!(
                "pan_min_digits ({}) exceeds pan_max_digits ({})",
                self.pan_min_digits, self.pan_max_digits
            )));
        }
        Ok(())
    }

    /// Whether the detector for `kind` runs under this configuration.
    pub fn is_enabled(&self, kind: PiiType) -> bool {
        match kind {
            PiiType::Pan => true,
            PiiType::Email => self.detect_emails,
            PiiType::Name => self.detect_names,
            PiiType::Address => self.detect_addresses,
            PiiType::Phone => self.detect_phones,
            PiiType::Cvv | PiiType::Expiry => self.detect_authentication_data,
        }
    }
}
