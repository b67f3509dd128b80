//! Pretty-printed JSON report sink

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sentinelpay_core::ReportSink;
use sentinelpay_domain::{ComplianceReport, Result};
use tracing::info;

use super::write_file;

#[derive(Debug, Clone)]
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSink for JsonReportSink {
    async fn write(&self, report: &ComplianceReport) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(report)?;
        bytes.push(b'\n');
        write_file(&self.path, &bytes).await?;

        info!(path = %self.path.display(), report_id = %report.report_id, "json_report_written");
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }
}
