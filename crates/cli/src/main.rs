//! # sentinelpay CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//!
//! Exit codes: `0` when a report was produced (even with degraded records
//! or after cancellation), `2` when no report could be produced, `3` when a
//! report was produced but a sink could not write it, `1` for setup failures
//! such as invalid configuration.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use sentinelpay_cli::commands::{render_summary, run_generate, run_report, GenerateArgs, RunArgs};
use sentinelpay_cli::logging::{self, log_command_execution};
use sentinelpay_cli::AppContext;
use sentinelpay_infra::config;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const EXIT_SETUP_FAILURE: u8 = 1;
const EXIT_NO_REPORT: u8 = 2;
const EXIT_SINK_FAILURE: u8 = 3;

/// PCI-DSS compliance pipeline: sanitize, analyze, explain.
#[derive(Parser, Debug)]
#[command(name = "sentinelpay", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to configuration file (TOML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline over a transaction log and write the report.
    Run(RunArgs),

    /// Write a synthetic transaction log.
    Generate(GenerateArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env is normal; note it once logging is up.
    let dotenv = dotenvy::dotenv();

    if let Err(err) = logging::init(cli.log_json, cli.verbose) {
        eprintln!("{err:#}");
        return ExitCode::from(EXIT_SETUP_FAILURE);
    }
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "could not load .env file"),
    }

    match cli.command {
        Commands::Run(args) => run(args, cli.config).await,
        Commands::Generate(args) => generate(args).await,
    }
}

async fn run(args: RunArgs, config_path: Option<PathBuf>) -> ExitCode {
    let started = Instant::now();

    let mut config = match config::load(config_path) {
        Ok(config) => config,
        Err(err) => {
            error!(kind = logging::error_label(&err), "{err}");
            return ExitCode::from(EXIT_SETUP_FAILURE);
        }
    };
    if let Some(concurrency) = args.concurrency {
        config.pipeline.max_concurrency = concurrency;
    }

    let context = match AppContext::new(config) {
        Ok(context) => context,
        Err(err) => {
            error!(kind = logging::error_label(&err), "{err}");
            return ExitCode::from(EXIT_SETUP_FAILURE);
        }
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing with a partial report");
            on_signal.cancel();
        }
    });

    let result = run_report(&args, &context, cancel).await;
    let succeeded = matches!(&result, Ok(outcome) if outcome.all_sinks_written());
    log_command_execution("run", started.elapsed(), succeeded);

    match result {
        Ok(outcome) => {
            println!("{}", render_summary(&outcome.report));
            if outcome.all_sinks_written() {
                return ExitCode::SUCCESS;
            }
            for failure in &outcome.sink_failures {
                eprintln!("report produced but could not be written: {failure}");
            }
            ExitCode::from(EXIT_SINK_FAILURE)
        }
        Err(err) => {
            error!("{err:#}");
            eprintln!("report could not be produced: {err:#}");
            ExitCode::from(EXIT_NO_REPORT)
        }
    }
}

async fn generate(args: GenerateArgs) -> ExitCode {
    let started = Instant::now();
    let result = run_generate(&args).await;
    log_command_execution("generate", started.elapsed(), result.is_ok());

    match result {
        Ok(count) => {
            println!("wrote {count} transactions to {}", args.output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(EXIT_SETUP_FAILURE)
        }
    }
}
