//! # SentinelPay CLI
//!
//! Command handlers behind the `sentinelpay` binary.
//!
//! - `run`: load a transaction log, run the pipeline, write report sinks
//! - `generate`: write a synthetic transaction log

pub mod commands;
pub mod context;
pub mod logging;

pub use context::AppContext;
