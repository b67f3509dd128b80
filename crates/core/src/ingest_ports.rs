//! Port for loading raw transactions into the pipeline

use async_trait::async_trait;
use sentinelpay_domain::{Result, TransactionRecord};

/// Source of raw transaction records (log files, fixtures, generators)
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Load every record the source holds, in source order
    async fn load(&self) -> Result<Vec<TransactionRecord>>;

    /// Human-readable description of the source, for logs
    fn describe(&self) -> String;
}
