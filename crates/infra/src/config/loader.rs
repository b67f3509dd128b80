//! Configuration loader
//!
//! Builds a [`SentinelConfig`] from an optional file plus environment
//! overrides, then validates it.
//!
//! ## Loading Strategy
//! 1. Use the explicit path if one is given, otherwise probe standard paths
//! 2. Fall back to defaults when no file is found
//! 3. Apply `SENTINELPAY_*` environment overrides
//! 4. Validate the result
//!
//! ## Environment Variables
//! - `SENTINELPAY_INFERENCE_URL`: Ollama base URL
//! - `SENTINELPAY_RISK_MODEL`: Model used for risk analysis
//! - `SENTINELPAY_COMPLIANCE_MODEL`: Model used for compliance explanations
//! - `SENTINELPAY_TIMEOUT_MS`: Per-attempt inference timeout
//! - `SENTINELPAY_MAX_ATTEMPTS`: Attempts per inference call
//! - `SENTINELPAY_TEMPERATURE`: Sampling temperature
//! - `SENTINELPAY_MAX_CONCURRENCY`: Records analyzed concurrently
//! - `SENTINELPAY_HIGH_VALUE_THRESHOLD`: Amount above which the rule screen
//!   flags an outlier
//! - `SENTINELPAY_RULES_ENABLED`: Whether the rule screen runs (true/false)
//! - `SENTINELPAY_EXPECTED_COUNTRIES`: Comma-separated countries outside of
//!   which the rule screen flags a geographic anomaly
//!
//! ## File Locations
//! The loader probes the following paths (in order), in the current working
//! directory and then next to the executable:
//! 1. `sentinelpay.toml`, `sentinelpay.json`
//! 2. `config.toml`, `config.json`

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sentinelpay_domain::constants::ENV_PREFIX;
use sentinelpay_domain::{Result, SentinelConfig, SentinelError};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["sentinelpay.toml", "sentinelpay.json", "config.toml", "config.json"];

/// Load configuration using the process environment for overrides.
///
/// # Arguments
/// * `path` - Explicit config file. If `None`, uses [`probe_config_paths`]
///   and falls back to defaults when nothing is found.
///
/// # Errors
/// Returns `SentinelError::Config` if:
/// - An explicit path does not exist
/// - The file format is invalid
/// - An override has an invalid value
/// - The final configuration fails validation
pub fn load(path: Option<PathBuf>) -> Result<SentinelConfig> {
    let mut config = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SentinelError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            load_from_file(&p)?
        }
        None => match probe_config_paths() {
            Some(p) => load_from_file(&p)?,
            None => {
                tracing::info!("No config file found, using defaults");
                SentinelConfig::default()
            }
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// Format is detected by file extension (`.json` or `.toml`). Missing
/// sections and fields take their defaults.
///
/// # Errors
/// Returns `SentinelError::Config` if the file cannot be read or parsed.
pub fn load_from_file(path: &Path) -> Result<SentinelConfig> {
    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| SentinelError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

fn parse_config(contents: &str, path: &Path) -> Result<SentinelConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| SentinelError::from(InfraError::from(e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SentinelError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SentinelError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Apply `SENTINELPAY_*` overrides read through `lookup`.
///
/// Unset variables leave the current value alone; set but unparseable ones
/// are an error rather than silently ignored.
///
/// # Errors
/// Returns `SentinelError::Config` naming the offending variable.
pub fn apply_env_overrides<F>(config: &mut SentinelConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));

    if let Some(url) = var("INFERENCE_URL") {
        config.inference.base_url = url;
    }
    if let Some(model) = var("RISK_MODEL") {
        config.inference.risk_model = model;
    }
    if let Some(model) = var("COMPLIANCE_MODEL") {
        config.inference.compliance_model = model;
    }
    if let Some(raw) = var("TIMEOUT_MS") {
        config.inference.timeout_ms = parse_var("TIMEOUT_MS", &raw)?;
    }
    if let Some(raw) = var("MAX_ATTEMPTS") {
        config.inference.max_attempts = parse_var("MAX_ATTEMPTS", &raw)?;
    }
    if let Some(raw) = var("TEMPERATURE") {
        config.inference.temperature = parse_var("TEMPERATURE", &raw)?;
    }
    if let Some(raw) = var("MAX_CONCURRENCY") {
        config.pipeline.max_concurrency = parse_var("MAX_CONCURRENCY", &raw)?;
    }
    if let Some(raw) = var("HIGH_VALUE_THRESHOLD") {
        config.rules.high_value_threshold = parse_var("HIGH_VALUE_THRESHOLD", &raw)?;
    }
    if let Some(raw) = var("RULES_ENABLED") {
        config.rules.enabled = parse_bool(&raw);
    }
    if let Some(raw) = var("EXPECTED_COUNTRIES") {
        config.rules.expected_countries = parse_list(&raw);
    }

    Ok(())
}

fn parse_var<T>(suffix: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| SentinelError::Config(format!("Invalid {ENV_PREFIX}{suffix}: {e}")))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty()).map(String::from).collect()
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Probe standard paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}
