//! Sanitization stage
//!
//! Turns raw transaction records into [`SanitizedRecord`]s. This is the only
//! stage that ever sees raw card data; everything downstream accepts
//! sanitized values only.
//!
//! [`SanitizedRecord`]: sentinelpay_domain::SanitizedRecord

pub mod sanitizer;

pub use sanitizer::{RecordView, Sanitizable, Sanitizer};
