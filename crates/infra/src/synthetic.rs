//! Synthetic card-transaction logs for demos and load tests
//!
//! Generated logs deliberately contain violations: every record carries a
//! Luhn-valid PAN and a cardholder name, a share carry a CVV, a share have
//! outlier amounts, and a share reuse a recent card minutes later from a
//! different country.

use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sentinelpay_domain::{Result, SentinelError, TransactionRecord};
use tracing::info;

const FIRST_NAMES: [&str; 10] =
    ["Alice", "Bruno", "Chen", "Dana", "Emeka", "Fatima", "Gustav", "Hana", "Ivan", "Julia"];
const LAST_NAMES: [&str; 10] = [
    "Anderson", "Bauer", "Costa", "Dubois", "Eriksen", "Fischer", "Garcia", "Haddad", "Ito",
    "Lee",
];
const MERCHANTS: [&str; 8] = [
    "Corner Cafe",
    "Northwind Electronics",
    "Blue Harbor Hotels",
    "QuickFuel Station 12",
    "Lumen Books",
    "Atlas Airlines",
    "FreshMart Grocery",
    "Pixel Games Online",
];
const DESCRIPTIONS: [&str; 6] = [
    "card present purchase",
    "online order",
    "contactless payment",
    "recurring subscription",
    "hotel pre-authorization",
    "fuel purchase",
];
const LOCATIONS: [(&str, &str); 8] = [
    ("London", "United Kingdom"),
    ("Berlin", "Germany"),
    ("Madrid", "Spain"),
    ("New York", "United States"),
    ("Toronto", "Canada"),
    ("Tokyo", "Japan"),
    ("Sydney", "Australia"),
    ("Sao Paulo", "Brazil"),
];

/// Card families as (IIN prefix, PAN length).
const CARD_FAMILIES: [(&str, usize); 5] =
    [("4", 16), ("51", 16), ("55", 16), ("37", 15), ("6011", 16)];

/// Generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub count: usize,
    /// Share of records carrying a CVV.
    pub cvv_rate: f64,
    /// Share of records with an amount between 5 000 and 25 000.
    pub high_amount_rate: f64,
    /// Share of records reusing the previous card shortly afterwards from a
    /// different country.
    pub repeat_card_rate: f64,
    /// Fixed seed for reproducible output.
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            cvv_rate: 0.10,
            high_amount_rate: 0.05,
            repeat_card_rate: 0.03,
            seed: None,
        }
    }
}

impl SyntheticConfig {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("cvv_rate", self.cvv_rate),
            ("high_amount_rate", self.high_amount_rate),
            ("repeat_card_rate", self.repeat_card_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(SentinelError::Config(format!("{name} must be within 0.0..=1.0")));
            }
        }
        Ok(())
    }
}

struct Card {
    pan: String,
    holder: String,
}

pub struct SyntheticGenerator {
    config: SyntheticConfig,
    rng: StdRng,
}

impl SyntheticGenerator {
    /// # Errors
    /// Returns `SentinelError::Config` when a rate is outside `0.0..=1.0`.
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    pub fn generate(&mut self) -> Vec<TransactionRecord> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
        let mut records: Vec<TransactionRecord> = Vec::with_capacity(self.config.count);
        let mut last: Option<(Card, DateTime<Utc>, usize)> = None;

        for index in 0..self.config.count {
            let repeat = last.is_some() && self.rng.gen_bool(self.config.repeat_card_rate);

            let (card, timestamp, location) = match last.take() {
                Some((card, at, previous_location)) if repeat => {
                    let later = at + Duration::minutes(self.rng.gen_range(2..45));
                    (card, later, self.other_location(previous_location))
                }
                _ => {
                    let offset = Duration::seconds(self.rng.gen_range(0..365 * 24 * 3600));
                    (self.card(), start + offset, self.rng.gen_range(0..LOCATIONS.len()))
                }
            };

            records.push(self.record(index, &card, timestamp, location));
            last = Some((card, timestamp, location));
        }

        info!(records = records.len(), seeded = self.config.seed.is_some(), "synthetic_generated");
        records
    }

    fn record(
        &mut self,
        index: usize,
        card: &Card,
        timestamp: DateTime<Utc>,
        location: usize,
    ) -> TransactionRecord {
        let amount = if self.rng.gen_bool(self.config.high_amount_rate) {
            self.rng.gen_range(5_000.0..25_000.0)
        } else {
            self.rng.gen_range(5.0..1_500.0)
        };
        let amount = (amount * 100.0_f64).round() / 100.0;

        let merchant = MERCHANTS.choose(&mut self.rng).copied().unwrap_or(MERCHANTS[0]);
        let description =
            DESCRIPTIONS.choose(&mut self.rng).copied().unwrap_or(DESCRIPTIONS[0]);
        let (city, country) = LOCATIONS[location];

        let id = format!("TX{:08}", index + 1);
        let mut record = TransactionRecord::new(id, merchant, amount, timestamp)
            .with_pan(card.pan.clone())
            .with_cardholder(card.holder.clone())
            .with_description(description)
            .with_location(Some(city.into()), Some(country.into()));

        if self.rng.gen_bool(self.config.cvv_rate) {
            let digits = if card.pan.len() == 15 { 4 } else { 3 };
            record = record.with_cvv(self.digits(digits));
        }
        record
    }

    fn card(&mut self) -> Card {
        let (prefix, length) = CARD_FAMILIES[self.rng.gen_range(0..CARD_FAMILIES.len())];
        let mut pan = String::from(prefix);
        pan.push_str(&self.digits(length - prefix.len() - 1));
        pan.push(luhn_check_digit(&pan));

        let first = FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or(FIRST_NAMES[0]);
        let last = LAST_NAMES.choose(&mut self.rng).copied().unwrap_or(LAST_NAMES[0]);
        Card { pan, holder: format!("{first} {last}") }
    }

    fn other_location(&mut self, previous: usize) -> usize {
        (previous + self.rng.gen_range(1..LOCATIONS.len())) % LOCATIONS.len()
    }

    fn digits(&mut self, count: usize) -> String {
        (0..count).map(|_| char::from(b'0' + self.rng.gen_range(0..10u8))).collect()
    }
}

/// Check digit that makes `payload` followed by it pass the Luhn test.
fn luhn_check_digit(payload: &str) -> char {
    let sum: u32 = payload
        .bytes()
        .rev()
        .map(|b| u32::from(b - b'0'))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    char::from(b'0' + ((10 - sum % 10) % 10) as u8)
}

/// Write records as a pretty JSON array.
///
/// # Errors
/// Returns `SentinelError::Io` if the file cannot be written.
pub async fn write_transactions(path: &Path, records: &[TransactionRecord]) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(records)?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|err| SentinelError::Io(format!("failed to write {}: {err}", path.display())))
}

#[cfg(test)]
mod tests {
    use sentinelpay_common::privacy::patterns::{card_brand, luhn_check};

    use super::*;

    fn generate(config: SyntheticConfig) -> Vec<TransactionRecord> {
        SyntheticGenerator::new(config).unwrap().generate()
    }

    #[test]
    fn check_digit_matches_known_pans() {
        assert_eq!(luhn_check_digit("411111111111111"), '1');
        assert_eq!(luhn_check_digit("37828224631000"), '5');
    }

    #[test]
    fn pans_are_luhn_valid_and_branded() {
        let records = generate(SyntheticConfig::default().with_count(200).with_seed(7));

        assert_eq!(records.len(), 200);
        for record in &records {
            let pan = record.pan.as_deref().unwrap();
            assert!(luhn_check(pan), "{} has an invalid PAN", record.id);
            assert!(card_brand(pan).is_some(), "{} has an unbranded PAN", record.id);
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = SyntheticConfig::default().with_count(50).with_seed(42);
        assert_eq!(generate(config.clone()), generate(config));
    }

    #[test]
    fn rates_control_violations() {
        let config = SyntheticConfig {
            count: 100,
            cvv_rate: 1.0,
            high_amount_rate: 1.0,
            repeat_card_rate: 0.0,
            seed: Some(1),
        };
        let records = generate(config);

        assert!(records.iter().all(|r| r.cvv.is_some()));
        assert!(records.iter().all(|r| (5_000.0..=25_000.0).contains(&r.amount)));
    }

    #[test]
    fn repeated_cards_move_country() {
        let config = SyntheticConfig {
            count: 10,
            cvv_rate: 0.0,
            high_amount_rate: 0.0,
            repeat_card_rate: 1.0,
            seed: Some(3),
        };
        let records = generate(config);

        let first_pan = records[0].pan.clone();
        for pair in records.windows(2) {
            assert_eq!(pair[1].pan, first_pan);
            assert!(pair[1].timestamp > pair[0].timestamp);
            assert_ne!(pair[1].location, pair[0].location);
        }
    }

    #[test]
    fn rejects_out_of_range_rates() {
        let config = SyntheticConfig { cvv_rate: 1.5, ..SyntheticConfig::default() };
        assert!(matches!(SyntheticGenerator::new(config), Err(SentinelError::Config(_))));
    }
}
