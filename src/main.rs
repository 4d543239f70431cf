/*!
 * EMS Kernel - Main Entry Point
 *
 * Runs job files through the concurrent event seating kernel:
 * - One fresh store and worker pool per job file
 * - Text or binary output written beside each input
 */

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use ems_kernel::{init_tracing, process_path, EmsConfig, OutputFormat};

#[derive(Parser)]
#[command(name = "ems")]
#[command(about = "Event seating kernel - process job files concurrently", long_about = None)]
struct Cli {
    /// Job file, or directory of *.jobs files
    path: PathBuf,

    /// Worker threads per job file
    #[arg(long, short)]
    threads: Option<usize>,

    /// Simulated delay before each state access, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Job files processed concurrently
    #[arg(long, short)]
    max_jobs: Option<usize>,

    /// Write binary frames instead of text
    #[arg(long)]
    binary: bool,

    /// Print run summaries as JSON to stdout
    #[arg(long)]
    stats: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize structured tracing
    init_tracing();

    let mut config = EmsConfig::from_env().context("Invalid EMS_* environment")?;
    if let Some(threads) = cli.threads {
        config = config.with_workers(threads);
    }
    if let Some(ms) = cli.delay_ms {
        config = config.with_state_access_delay(Duration::from_millis(ms));
    }
    if let Some(max_jobs) = cli.max_jobs {
        config = config.with_max_jobs(max_jobs);
    }
    config.validate().context("Invalid configuration")?;

    let format = if cli.binary {
        OutputFormat::Binary
    } else {
        OutputFormat::Text
    };

    info!(
        path = %cli.path.display(),
        workers = config.workers,
        delay_ms = config.state_access_delay.as_millis() as u64,
        max_jobs = config.max_jobs,
        "EMS kernel starting"
    );

    let reports = process_path(&cli.path, &config, format)
        .with_context(|| format!("Failed to process {}", cli.path.display()))?;

    if cli.stats {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    info!(files = reports.len(), "EMS kernel finished");
    Ok(())
}
