use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use opentelemetry::KeyValue;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{info, warn};

use skifte_config::SkifteConfig;
use skifte_core::net::{chorded_mesh, TopologySpec};
use skifte_engine::engine::validate_state_hash;
use skifte_engine::{DiagnosticsCollector, SimulationOutcome, SimulationReport, SimulationRuntime};
use skifte_telemetry::logging::EventLogger;
use skifte_telemetry::metrics::MetricsRecorder;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one deterministic simulation
    Simulate(SimulateArgs),
    /// Monte-Carlo repetition over an auto-incrementing seed range
    Batch(BatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Optional configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// Override the configured MTD scheme
    #[arg(long)]
    pub scheme: Option<String>,
    /// Hosts in the generated demo topology
    #[arg(long, default_value_t = 12)]
    pub hosts: usize,
    /// Extra random edges on top of the base ring
    #[arg(long, default_value_t = 3)]
    pub chords: usize,
    /// Write the full report to this path as YAML
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Fail unless the final state hash matches
    #[arg(long)]
    pub validate_hash: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Optional configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Number of runs; seeds increment from --seed
    #[arg(long, default_value_t = 16)]
    pub runs: usize,
    /// First seed of the batch
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
    /// Override the configured MTD scheme
    #[arg(long)]
    pub scheme: Option<String>,
    /// Hosts in the generated demo topology
    #[arg(long, default_value_t = 12)]
    pub hosts: usize,
    /// Extra random edges on top of the base ring
    #[arg(long, default_value_t = 3)]
    pub chords: usize,
    /// Parallel workers (defaults to available CPUs)
    #[arg(long)]
    pub workers: Option<usize>,
}

pub async fn run_simulation_mode(
    args: SimulateArgs,
    metrics: MetricsRecorder,
) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref(), args.seed, args.scheme.as_deref())?;
    EventLogger::init_with_level(&config.telemetry.log_level);

    let topology = demo_topology(&config, args.hosts, args.chords);
    let runtime = SimulationRuntime::new(&config, topology, Arc::new(metrics))?;
    let report = tokio::task::spawn_blocking(move || runtime.run())
        .await
        .context("simulation task panicked")?;

    log_report(&report).await;

    if let Some(path) = &args.output {
        let yaml = serde_yaml::to_string(&report)?;
        std::fs::write(path, yaml)
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    if let Some(expected) = &args.validate_hash {
        let mut diagnostics = DiagnosticsCollector::new();
        validate_state_hash(expected, &report, &mut diagnostics)?;
    }

    Ok(())
}

pub async fn run_batch_mode(args: BatchArgs, metrics: MetricsRecorder) -> anyhow::Result<()> {
    let base = load_config(args.config.as_deref(), None, args.scheme.as_deref())?;
    EventLogger::init_with_level(&base.telemetry.log_level);

    let workers = args.workers.unwrap_or_else(num_cpus::get).max(1);
    let semaphore = Arc::new(tokio::sync::Semaphore::new(workers));
    let metrics = Arc::new(metrics);

    info!(
        runs = args.runs,
        first_seed = args.seed,
        workers,
        scheme = %base.simulation.scheme,
        "starting batch"
    );

    let mut handles = Vec::with_capacity(args.runs);
    for i in 0..args.runs {
        let mut config = base.clone();
        config.simulation.seed = args.seed + i as u64;

        let topology = demo_topology(&config, args.hosts, args.chords);
        let runtime = SimulationRuntime::new(&config, topology, metrics.clone())?;

        let permit = semaphore.clone().acquire_owned().await?;
        handles.push(tokio::task::spawn_blocking(move || {
            let report = runtime.run();
            drop(permit);
            report
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(e) => warn!(error = %e, "batch run panicked"),
        }
    }

    summarize_batch(&reports);
    Ok(())
}

fn load_config(
    path: Option<&std::path::Path>,
    seed: Option<u64>,
    scheme: Option<&str>,
) -> anyhow::Result<SkifteConfig> {
    let mut config = match path {
        Some(p) => SkifteConfig::load_from_path(p)?,
        None => SkifteConfig::load()?,
    };
    if let Some(seed) = seed {
        config.simulation.seed = seed;
    }
    if let Some(scheme) = scheme {
        config.simulation.scheme = scheme.to_string();
    }
    Ok(config)
}

/// Demo topology derived from the run seed, so every seed sees a
/// different but reproducible network.
fn demo_topology(config: &SkifteConfig, hosts: usize, chords: usize) -> TopologySpec {
    let mut rng = SmallRng::seed_from_u64(config.simulation.seed.wrapping_mul(0x9E37_79B9));
    chorded_mesh(hosts, chords, &mut rng)
}

async fn log_report(report: &SimulationReport) {
    info!(
        outcome = ?report.outcome,
        elapsed_secs = report.elapsed_ns as f64 / 1e9,
        compromised = report.compromised_hosts.len(),
        reachable = report.reachable.len(),
        mtd_executed = report.mtd.executed,
        mtd_suspended = report.mtd.suspended,
        interrupts = report.interrupted_records().count(),
        state_hash = %report.state_hash,
        "simulation complete"
    );
    EventLogger::log_event(
        "simulation_complete",
        vec![
            KeyValue::new("scheme", report.scheme.clone()),
            KeyValue::new("seed", report.seed as i64),
            KeyValue::new("outcome", format!("{:?}", report.outcome)),
            KeyValue::new("compromised", report.compromised_hosts.len() as i64),
        ],
    )
    .await;
}

fn summarize_batch(reports: &[SimulationReport]) {
    if reports.is_empty() {
        warn!("batch produced no reports");
        return;
    }

    let full: Vec<&SimulationReport> = reports
        .iter()
        .filter(|r| r.outcome == SimulationOutcome::FullyCompromised)
        .collect();
    let mean_ttc_secs = if full.is_empty() {
        f64::NAN
    } else {
        full.iter().map(|r| r.elapsed_ns as f64 / 1e9).sum::<f64>() / full.len() as f64
    };
    let interrupts: usize = reports.iter().map(|r| r.interrupted_records().count()).sum();
    let executed: u64 = reports.iter().map(|r| r.mtd.executed).sum();
    let suspended: u64 = reports.iter().map(|r| r.mtd.suspended).sum();

    info!(
        runs = reports.len(),
        fully_compromised = full.len(),
        compromise_rate = full.len() as f64 / reports.len() as f64,
        mean_time_to_compromise_secs = mean_ttc_secs,
        mtd_executed = executed,
        mtd_suspended = suspended,
        interrupts,
        "batch complete"
    );
}
