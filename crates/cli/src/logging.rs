//! Logging bootstrap and structured logging helpers

use std::time::Duration;

use sentinelpay_domain::SentinelError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise verbosity picks `info`, `debug` or
/// `trace`. Logs go to stderr so stdout stays free for the run summary.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init(json: bool, verbose: u8) -> anyhow::Result<()> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

/// Log the outcome of a command execution with structured fields.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `SentinelError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &SentinelError) -> &'static str {
    match error {
        SentinelError::Config(_) => "config",
        SentinelError::Io(_) => "io",
        SentinelError::Serialization(_) => "serialization",
        SentinelError::InvalidInput(_) => "invalid_input",
        SentinelError::Inference(_) => "inference",
        SentinelError::Pipeline(_) => "pipeline",
        SentinelError::Internal(_) => "internal",
    }
}
