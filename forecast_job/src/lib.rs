//! # Forecast Job
//!
//! `forecast_job` runs the monthly forecasters as a batch job: it loads the
//! daily, partial-month and monthly tables from CSV files, forecasts every
//! day of a date range with the configured strategies and writes one record
//! per day to a CSV or JSON-lines file.
//!
//! ## Usage Example
//!
//! ```no_run
//! use clap::Parser;
//! use forecast_job::{cli::Args, config::JobConfig, logging, run_job};
//!
//! let args = Args::parse();
//! let config = JobConfig::load(&args)?;
//! let _guard = logging::init(&config.logging)?;
//!
//! let summary = run_job(&config, &args)?;
//! println!("{} records written", summary.written);
//! # Ok::<(), forecast_job::JobError>(())
//! ```

use monthly_forecast::ForecastError;
use thiserror::Error;

pub mod cli;
pub mod config;
pub mod job;
pub mod logging;
pub mod sink;

pub use crate::job::{date_range, run_job};

/// Errors that can occur while running the forecast job
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Result type for job operations
pub type Result<T> = std::result::Result<T, JobError>;
