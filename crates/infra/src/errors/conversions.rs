//! Conversions from external library errors into SentinelPay errors.
//!
//! Infrastructure adapters wrap foreign errors in [`InfraError`] and convert
//! to [`SentinelError`] at the port boundary.

use std::fmt;

use reqwest::Error as HttpError;
use sentinelpay_domain::SentinelError;

/// Newtype wrapper so `?` works on foreign errors inside infra.
#[derive(Debug)]
pub struct InfraError(pub SentinelError);

impl fmt::Display for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for InfraError {}

impl From<InfraError> for SentinelError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SentinelError> for InfraError {
    fn from(value: SentinelError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SentinelError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        if value.is_builder() {
            return InfraError(SentinelError::Config(format!("invalid HTTP client setup: {value}")));
        }
        if let Some(status) = value.status() {
            let message = format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            );
            return InfraError(SentinelError::Inference(message));
        }
        InfraError(SentinelError::Inference(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* toml / io */
/* -------------------------------------------------------------------------- */

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(SentinelError::Config(format!("invalid TOML: {}", value.message())))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(SentinelError::Io(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
