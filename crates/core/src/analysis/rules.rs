//! Deterministic rule screen over sanitized records

use sentinelpay_common::privacy::patterns::is_placeholder;
use sentinelpay_domain::{
    FindingSource, RecordField, RiskCategory, RiskFinding, RuleConfig, SanitizedRecord,
    SensitiveCategory, Severity,
};

// Fields that should never have carried a card number.
const FREE_TEXT_FIELDS: [(RecordField, &str); 4] = [
    (RecordField::Description, "description"),
    (RecordField::Merchant, "merchant"),
    (RecordField::Id, "identifier"),
    (RecordField::Country, "country"),
];

/// Rule-based findings derived from the redaction log, amount and country.
///
/// Each rule fires at most once per record. Rules only look at one record,
/// so screening is independent of batch composition.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleScreen {
    high_value_threshold: f64,
    /// Lowercased; empty disables the geographic rule.
    expected_countries: Vec<String>,
}

impl RuleScreen {
    pub fn new(high_value_threshold: f64) -> Self {
        Self { high_value_threshold, expected_countries: Vec::new() }
    }

    /// Flag records from countries outside `countries`.
    pub fn with_expected_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.expected_countries = countries
            .into_iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }

    /// `None` when rules are disabled.
    pub fn from_config(config: &RuleConfig) -> Option<Self> {
        config.enabled.then(|| {
            Self::new(config.high_value_threshold)
                .with_expected_countries(&config.expected_countries)
        })
    }

    pub fn high_value_threshold(&self) -> f64 {
        self.high_value_threshold
    }

    pub fn screen(&self, record: &SanitizedRecord) -> Vec<RiskFinding> {
        let mut findings = Vec::new();

        let exposed: Vec<&str> = FREE_TEXT_FIELDS
            .iter()
            .filter(|(field, _)| record.has_redaction_in(*field, SensitiveCategory::Pan))
            .map(|(_, name)| *name)
            .collect();
        if !exposed.is_empty() {
            findings.push(rule_finding(
                record,
                Severity::Critical,
                RiskCategory::SensitiveDataExposure,
                format!(
                    "Primary account number found in unprotected {} field(s)",
                    exposed.join(", ")
                ),
            ));
        }

        let cvv = record.has_redaction(SensitiveCategory::Cvv);
        let expiry = record.has_redaction(SensitiveCategory::Expiry);
        if cvv || expiry {
            let what = match (cvv, expiry) {
                (true, true) => "Card verification value and expiry date",
                (true, false) => "Card verification value",
                _ => "Expiry date",
            };
            findings.push(rule_finding(
                record,
                Severity::Critical,
                RiskCategory::SensitiveAuthenticationData,
                format!("{what} retained in the transaction log after authorization"),
            ));
        }

        if record.amount > self.high_value_threshold {
            findings.push(rule_finding(
                record,
                Severity::Medium,
                RiskCategory::AmountOutlier,
                format!(
                    "Amount {:.2} exceeds the review threshold of {:.2}",
                    record.amount, self.high_value_threshold
                ),
            ));
        }

        if let Some(country) = self.unexpected_country(record) {
            findings.push(rule_finding(
                record,
                Severity::Medium,
                RiskCategory::GeographicAnomaly,
                format!("Transaction originated in {country}, outside the expected countries"),
            ));
        }

        findings
    }

    fn unexpected_country<'a>(&self, record: &'a SanitizedRecord) -> Option<&'a str> {
        if self.expected_countries.is_empty() {
            return None;
        }
        let country = record.country.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        if is_placeholder(country) {
            return None;
        }
        let wanted = country.to_lowercase();
        let known = self.expected_countries.iter().any(|c| *c == wanted);
        (!known).then_some(country)
    }
}

fn rule_finding(
    record: &SanitizedRecord,
    severity: Severity,
    category: RiskCategory,
    rationale: String,
) -> RiskFinding {
    RiskFinding {
        record_id: record.id.clone(),
        severity,
        category,
        rationale,
        source: FindingSource::Rule,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sentinelpay_domain::{PciRequirement, Redaction};

    use super::*;

    fn sanitized(amount: f64, redactions: Vec<Redaction>) -> SanitizedRecord {
        SanitizedRecord {
            id: "tx-1".into(),
            pan_token: Some("****1111".into()),
            card_brand: Some("visa".into()),
            merchant: "Corner Cafe".into(),
            description: String::new(),
            amount,
            timestamp: Utc::now(),
            cardholder: None,
            country: None,
            redactions,
        }
    }

    #[test]
    fn clean_low_value_record_yields_nothing() {
        let record =
            sanitized(20.0, vec![Redaction::new(RecordField::Pan, SensitiveCategory::Pan)]);
        assert!(RuleScreen::new(1000.0).screen(&record).is_empty());
    }

    /// Validates every rule firing on one record.
    ///
    /// Assertions:
    /// - PAN in description is a critical exposure.
    /// - CVV is critical authentication data.
    /// - The amount outlier is medium.
    /// - All findings are tagged as rule findings.
    #[test]
    fn all_rules_fire_once() {
        let record = sanitized(
            5000.0,
            vec![
                Redaction::new(RecordField::Description, SensitiveCategory::Pan),
                Redaction::new(RecordField::Merchant, SensitiveCategory::Pan),
                Redaction::new(RecordField::Cvv, SensitiveCategory::Cvv),
            ],
        );

        let findings = RuleScreen::new(1000.0).screen(&record);
        let categories: Vec<_> = findings.iter().map(|f| f.category).collect();

        assert_eq!(
            categories,
            vec![
                RiskCategory::SensitiveDataExposure,
                RiskCategory::SensitiveAuthenticationData,
                RiskCategory::AmountOutlier,
            ]
        );
        assert_eq!(findings[0].severity, Severity::Critical);
        assert!(findings[0].rationale.contains("description, merchant"));
        assert_eq!(findings[2].severity, Severity::Medium);
        assert!(findings.iter().all(|f| f.source == FindingSource::Rule));
    }

    #[test]
    fn threshold_is_exclusive() {
        let record = sanitized(1000.0, Vec::new());
        assert!(RuleScreen::new(1000.0).screen(&record).is_empty());
    }

    fn from_country(country: Option<&str>) -> SanitizedRecord {
        SanitizedRecord { country: country.map(String::from), ..sanitized(20.0, Vec::new()) }
    }

    /// Validates the geographic rule.
    ///
    /// Assertions:
    /// - A country outside the list is a medium geographic anomaly under 10.6.
    /// - Matching ignores case and surrounding whitespace.
    /// - Records without a country, or with a redacted one, are not flagged.
    #[test]
    fn unexpected_country_is_flagged() {
        let screen = RuleScreen::new(1000.0).with_expected_countries(["US", " Australia "]);

        let findings = screen.screen(&from_country(Some("Japan")));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, RiskCategory::GeographicAnomaly);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].requirement(), PciRequirement::ReviewLogs);
        assert!(findings[0].rationale.contains("Japan"));

        assert!(screen.screen(&from_country(Some("us"))).is_empty());
        assert!(screen.screen(&from_country(Some("australia"))).is_empty());
        assert!(screen.screen(&from_country(None)).is_empty());
        assert!(screen.screen(&from_country(Some("[REDACTED:ADDRESS]"))).is_empty());
    }

    #[test]
    fn empty_country_list_disables_geographic_rule() {
        let screen = RuleScreen::from_config(&RuleConfig::default()).expect("enabled");
        assert!(screen.screen(&from_country(Some("Japan"))).is_empty());

        let config =
            RuleConfig { expected_countries: vec!["Germany".into()], ..RuleConfig::default() };
        let screen = RuleScreen::from_config(&config).expect("enabled");
        assert_eq!(screen.screen(&from_country(Some("France"))).len(), 1);
    }

    #[test]
    fn disabled_config_yields_no_screen() {
        let config = RuleConfig { enabled: false, ..RuleConfig::default() };
        assert!(RuleScreen::from_config(&config).is_none());
    }
}
