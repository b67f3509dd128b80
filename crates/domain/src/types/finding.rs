//! Risk findings and the PCI DSS requirements they map to

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SentinelError;

/// Finding severity. Ordered so that `max()` yields the rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] =
        [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// High and critical findings mark a record as high risk.
    pub fn is_high_risk(self) -> bool {
        self >= Severity::High
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = SentinelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(SentinelError::InvalidInput(format!("unknown severity '{other}'"))),
        }
    }
}

/// What kind of risk a finding describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    VelocityAnomaly,
    MerchantMismatch,
    AmountOutlier,
    GeographicAnomaly,
    /// Cardholder data (PAN) present where it must not be stored.
    SensitiveDataExposure,
    /// CVV or expiry date present after authorization.
    SensitiveAuthenticationData,
    Other,
}

impl RiskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskCategory::VelocityAnomaly => "velocity_anomaly",
            RiskCategory::MerchantMismatch => "merchant_mismatch",
            RiskCategory::AmountOutlier => "amount_outlier",
            RiskCategory::GeographicAnomaly => "geographic_anomaly",
            RiskCategory::SensitiveDataExposure => "sensitive_data_exposure",
            RiskCategory::SensitiveAuthenticationData => "sensitive_authentication_data",
            RiskCategory::Other => "other",
        }
    }

    /// PCI DSS requirement a finding of this category is reported under.
    pub fn requirement(self) -> PciRequirement {
        match self {
            RiskCategory::SensitiveDataExposure => PciRequirement::RenderPanUnreadable,
            RiskCategory::SensitiveAuthenticationData => PciRequirement::NoSensitiveAuthData,
            RiskCategory::VelocityAnomaly
            | RiskCategory::AmountOutlier
            | RiskCategory::GeographicAnomaly => PciRequirement::ReviewLogs,
            RiskCategory::MerchantMismatch | RiskCategory::Other => {
                PciRequirement::IncidentResponse
            }
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskCategory {
    type Err = SentinelError;

    /// Case-insensitive; spaces and dashes are treated as underscores so
    /// "Velocity Anomaly" and "velocity-anomaly" both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        match normalized.as_str() {
            "velocity_anomaly" | "velocity" => Ok(RiskCategory::VelocityAnomaly),
            "merchant_mismatch" => Ok(RiskCategory::MerchantMismatch),
            "amount_outlier" | "high_amount" => Ok(RiskCategory::AmountOutlier),
            "geographic_anomaly" | "location_anomaly" => Ok(RiskCategory::GeographicAnomaly),
            "sensitive_data_exposure" => Ok(RiskCategory::SensitiveDataExposure),
            "sensitive_authentication_data" => Ok(RiskCategory::SensitiveAuthenticationData),
            "other" => Ok(RiskCategory::Other),
            _ => Err(SentinelError::InvalidInput(format!("unknown risk category '{s}'"))),
        }
    }
}

/// PCI DSS requirements findings are grouped under.
///
/// Declaration order is numeric requirement order, so the derived `Ord`
/// sorts report sections 3.2, 3.4, 10.6, 12.10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PciRequirement {
    #[serde(rename = "3.2")]
    NoSensitiveAuthData,
    #[serde(rename = "3.4")]
    RenderPanUnreadable,
    #[serde(rename = "10.6")]
    ReviewLogs,
    #[serde(rename = "12.10")]
    IncidentResponse,
}

impl PciRequirement {
    pub fn code(self) -> &'static str {
        match self {
            PciRequirement::NoSensitiveAuthData => "3.2",
            PciRequirement::RenderPanUnreadable => "3.4",
            PciRequirement::ReviewLogs => "10.6",
            PciRequirement::IncidentResponse => "12.10",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PciRequirement::NoSensitiveAuthData => {
                "Do not store sensitive authentication data after authorization"
            }
            PciRequirement::RenderPanUnreadable => {
                "Render PAN unreadable anywhere it is stored"
            }
            PciRequirement::ReviewLogs => "Review logs and security events",
            PciRequirement::IncidentResponse => "Implement an incident response plan",
        }
    }

    /// Remediation used when no generated guidance is available.
    pub fn standard_remediation(self) -> &'static str {
        match self {
            PciRequirement::NoSensitiveAuthData => {
                "Purge CVV, CVC and expiry values from transaction logs and stop capturing \
                 them after authorization; verify log pipelines drop these fields at source."
            }
            PciRequirement::RenderPanUnreadable => {
                "Mask or tokenize PANs in all stored logs so that at most the last four digits \
                 remain visible, and rotate any storage that held full card numbers."
            }
            PciRequirement::ReviewLogs => {
                "Review the flagged transactions daily, confirm or dismiss each anomaly, and \
                 record the outcome in the security event log."
            }
            PciRequirement::IncidentResponse => {
                "Escalate the flagged transactions through the incident response plan, assign \
                 an owner, and document containment and follow-up actions."
            }
        }
    }
}

impl fmt::Display for PciRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PCI DSS {}", self.code())
    }
}

/// Whether a finding came from the language model or a deterministic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSource {
    Model,
    Rule,
}

/// A flagged risk on one sanitized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub record_id: String,
    pub severity: Severity,
    pub category: RiskCategory,
    pub rationale: String,
    pub source: FindingSource,
}

impl RiskFinding {
    pub fn requirement(&self) -> PciRequirement {
        self.category.requirement()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_for_rollup() {
        let rollup = [Severity::Medium, Severity::Critical, Severity::Low].into_iter().max();
        assert_eq!(rollup, Some(Severity::Critical));
        assert!(Severity::High.is_high_risk());
        assert!(!Severity::Medium.is_high_risk());
    }

    #[test]
    fn parses_model_spellings() {
        assert_eq!("HIGH".parse::<Severity>().ok(), Some(Severity::High));
        assert!("severe".parse::<Severity>().is_err());
        assert_eq!(
            "Velocity Anomaly".parse::<RiskCategory>().ok(),
            Some(RiskCategory::VelocityAnomaly)
        );
        assert_eq!(
            "merchant-mismatch".parse::<RiskCategory>().ok(),
            Some(RiskCategory::MerchantMismatch)
        );
        assert!("card testing".parse::<RiskCategory>().is_err());
    }

    #[test]
    fn requirements_sort_numerically() {
        let mut reqs = vec![
            PciRequirement::IncidentResponse,
            PciRequirement::RenderPanUnreadable,
            PciRequirement::ReviewLogs,
            PciRequirement::NoSensitiveAuthData,
        ];
        reqs.sort();
        let codes: Vec<_> = reqs.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec!["3.2", "3.4", "10.6", "12.10"]);
    }

    #[test]
    fn categories_map_to_requirements() {
        assert_eq!(
            RiskCategory::SensitiveDataExposure.requirement(),
            PciRequirement::RenderPanUnreadable
        );
        assert_eq!(
            RiskCategory::SensitiveAuthenticationData.requirement(),
            PciRequirement::NoSensitiveAuthData
        );
        assert_eq!(RiskCategory::GeographicAnomaly.requirement(), PciRequirement::ReviewLogs);
        assert_eq!(RiskCategory::Other.requirement(), PciRequirement::IncidentResponse);
        assert_eq!(
            serde_json::to_string(&PciRequirement::IncidentResponse).expect("serialize"),
            "\"12.10\""
        );
    }
}
