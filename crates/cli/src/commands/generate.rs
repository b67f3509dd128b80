//! `sentinelpay generate` - write a synthetic transaction log

use std::path::PathBuf;

use clap::Args;
use sentinelpay_infra::synthetic::{write_transactions, SyntheticConfig, SyntheticGenerator};
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Number of transactions to generate.
    #[arg(long, short = 'n', default_value_t = 1000)]
    pub count: usize,

    /// Output file (JSON array).
    #[arg(long, short)]
    pub output: PathBuf,

    /// Seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Share of records carrying a CVV.
    #[arg(long, default_value_t = 0.10)]
    pub cvv_rate: f64,

    /// Share of records with an outlier amount.
    #[arg(long, default_value_t = 0.05)]
    pub high_amount_rate: f64,
}

/// Generate and write the log, returning the number of records written.
///
/// # Errors
/// Fails on out-of-range rates or an unwritable output path.
pub async fn run_generate(args: &GenerateArgs) -> anyhow::Result<usize> {
    let config = SyntheticConfig {
        count: args.count,
        cvv_rate: args.cvv_rate,
        high_amount_rate: args.high_amount_rate,
        seed: args.seed,
        ..SyntheticConfig::default()
    };

    let records = SyntheticGenerator::new(config)?.generate();
    write_transactions(&args.output, &records).await?;

    info!(records = records.len(), output = %args.output.display(), "synthetic_log_written");
    Ok(records.len())
}
