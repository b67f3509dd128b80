//! Subcommand handlers

pub mod generate;
pub mod run;

pub use generate::{run_generate, GenerateArgs};
pub use run::{render_summary, run_report, RunArgs, RunOutcome};
