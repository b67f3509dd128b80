//! Ollama integration for local text generation
//!
//! Provides [`OllamaClient`], the production [`TextGenerator`] backend. It
//! talks to the Ollama chat endpoint and hands raw completion text to the
//! inference gateway, which owns retries, timeouts and JSON extraction.
//!
//! # Error mapping
//!
//! - Connection failures, 5xx and 429 responses: `Unavailable` (retried by
//!   the gateway)
//! - Client-side timeout: `Timeout`
//! - A 2xx body that is not a chat envelope: `Malformed`
//!
//! Response bodies are never logged; they may echo prompt content.
//!
//! [`TextGenerator`]: sentinelpay_core::TextGenerator

pub mod client;
pub mod types;

pub use client::OllamaClient;
pub use types::OllamaError;
