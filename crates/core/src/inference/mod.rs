//! Inference gateway: the single capability object through which the
//! pipeline talks to a language model.

pub mod gateway;
pub mod ports;
pub mod structured;

pub use gateway::{InferenceGateway, UnavailableOnly};
pub use ports::{GenerationOptions, Prompt, TextGenerator};
pub use structured::{extract_json_payload, parse_json};
