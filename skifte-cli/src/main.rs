//! ## skifte-cli
//! **Unified operational interface**
//! Skifte main entrypoint: deterministic single runs and Monte-Carlo
//! batches over the MTD evaluation engine.
//!
//! ### Expectations:
//! - POSIX-compliant argument parsing
//! - Reproducible runs for a fixed seed and configuration

use clap::Parser;

use skifte_telemetry::metrics::MetricsRecorder;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let metrics = MetricsRecorder::new();

    match cli.command {
        Commands::Simulate(args) => commands::run_simulation_mode(args, metrics).await,
        Commands::Batch(args) => commands::run_batch_mode(args, metrics).await,
    }
}
