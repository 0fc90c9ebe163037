//! `monthly_forecast_job` binary.
//!
//! Loads the analytics tables, forecasts every day from `--start-date` up to
//! (not including) `--end-date` and writes the records to the configured
//! output file. Logs go to a new file under the configured log directory.

use anyhow::{Context, Result};
use clap::Parser;
use forecast_job::{cli::Args, config::JobConfig, logging, run_job};
use tracing::{error, info};

fn main() -> Result<()> {
    let args = Args::parse();
    let config = JobConfig::load(&args).context("Failed to load configuration")?;
    let _guard = logging::init(&config.logging).context("Failed to initialize logging")?;

    info!(version = env!("CARGO_PKG_VERSION"), "monthly forecast job starting");

    match run_job(&config, &args) {
        Ok(summary) => {
            info!(
                days = summary.days,
                written = summary.written,
                sink_failures = summary.sink_failures,
                "monthly forecast job done"
            );
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "monthly forecast job failed");
            Err(err).context("Forecast job failed")
        }
    }
}
