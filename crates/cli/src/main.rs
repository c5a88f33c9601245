//! k8s-gather CLI
//!
//! Gathers the autoscaling metrics of a Kubernetes scale target from a
//! recorded cluster snapshot and prints them as a table or JSON.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use gather_lib::Snapshot;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::{LogFormat, Settings};

/// Kubernetes metric gathering CLI
#[derive(Parser)]
#[command(name = "k8s-gather")]
#[command(author, version, about = "Gather autoscaling metrics for a Kubernetes scale target", long_about = None)]
pub struct Cli {
    /// Snapshot file to gather from ("-" reads stdin)
    #[arg(long, short)]
    pub snapshot: String,

    /// Namespace of the scale target (overrides the snapshot's)
    #[arg(long, short)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Settings file (json, toml or yaml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,
}

fn init_tracing(format: LogFormat, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let registry = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    );

    // stdout carries the gathered metrics, logs go to stderr
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn read_snapshot(source: &str) -> Result<Snapshot> {
    if source == "-" {
        Snapshot::from_reader(std::io::stdin().lock())
    } else {
        Snapshot::load(Path::new(source))
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    init_tracing(settings.log_format, cli.verbose);

    let snapshot = read_snapshot(&cli.snapshot)?;
    debug!(
        source = %cli.snapshot,
        pods = snapshot.pods.len(),
        specs = snapshot.metrics.len(),
        "Loaded snapshot"
    );

    commands::gather::gather_snapshot(snapshot, cli.namespace, &settings, cli.format).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
