//! Report sinks
//!
//! Both sinks are pure consumers of a finished [`ComplianceReport`]; neither
//! reads records or calls inference.
//!
//! [`ComplianceReport`]: sentinelpay_domain::ComplianceReport

pub mod json;
pub mod latex;

use std::path::Path;

use sentinelpay_domain::{Result, SentinelError};

pub use json::JsonReportSink;
pub use latex::{render_latex, LatexReportSink};

/// Write `bytes` to `path`, creating missing parent directories.
async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|err| SentinelError::Io(format!("failed to write {}: {err}", path.display())))
}
