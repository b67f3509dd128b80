//! Resilience patterns for fault tolerance and error handling
//!
//! This module provides a **generic, reusable** retry executor with
//! configurable backoff and jitter. Whether a given error is worth retrying
//! is decided by a caller-supplied [`RetryPolicy`], which keeps the executor
//! independent of any particular error taxonomy.

pub mod retry;

// Re-export retry types
pub use retry::{
    BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
