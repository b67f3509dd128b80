//! Transaction log ingestion from JSON files

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sentinelpay_core::TransactionSource;
use sentinelpay_domain::{Result, SentinelError, TransactionRecord};
use tracing::{info, instrument};

/// Parse a JSON array of transaction records.
///
/// Accepts the field aliases emitted by the synthetic log generator
/// (`transaction_id`, `card_number`, `transaction_amount`, ...).
///
/// # Errors
/// `SentinelError::InvalidInput` when the document is not an array of
/// records or a record has an empty identifier. Messages carry positions
/// only; the input may hold raw card data.
pub fn parse_transactions(contents: &str) -> Result<Vec<TransactionRecord>> {
    let records: Vec<TransactionRecord> = serde_json::from_str(contents).map_err(|err| {
        SentinelError::InvalidInput(format!(
            "transaction log is not a JSON array of records ({:?} error at line {}, column {})",
            err.classify(),
            err.line(),
            err.column()
        ))
    })?;

    if let Some(index) = records.iter().position(|record| record.id.trim().is_empty()) {
        return Err(SentinelError::InvalidInput(format!(
            "record at index {index} has an empty identifier"
        )));
    }

    Ok(records)
}

/// [`TransactionSource`] reading one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TransactionSource for JsonFileSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Vec<TransactionRecord>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            SentinelError::Io(format!("failed to read {}: {err}", self.path.display()))
        })?;

        let records = parse_transactions(&contents)?;
        info!(records = records.len(), "transactions_loaded");
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}
