use thiserror::Error;

/// Errors raised while building a pattern matcher.
///
/// Detection and redaction themselves are total; only construction can fail.
#[derive(Debug, Error)]
pub enum PiiError {
    #[error("Invalid detector configuration: {0}")]
    Configuration(String),

    #[error("Pattern compilation error: {0}")]
    PatternCompilation(#[from] regex::Error),
}

pub type PiiResult<T> = Result<T, PiiError>;
