//! The forecast job: load, forecast, write

use crate::cli::Args;
use crate::config::JobConfig;
use crate::sink::{open_sink, EchoSink};
use crate::{JobError, Result};
use chrono::{Local, NaiveDate};
use monthly_forecast::{ColumnConverters, DataLoader, ForecastRunner, RunSummary};
use std::fs::{self, File};
use std::io::BufWriter;
use std::time::Instant;
use tracing::{info, warn};

/// Resolve the half-open range of days to forecast.
///
/// The command line wins over the configuration; the end defaults to
/// `today`, which is therefore never forecast itself.
pub fn date_range(config: &JobConfig, args: &Args, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let start = args
        .start_date
        .or(config.forecast.start_date)
        .ok_or_else(|| {
            JobError::InvalidArgument(
                "a start date is required (--start-date or forecast.start_date)".to_string(),
            )
        })?;
    let end = args
        .end_date(today)
        .or(config.forecast.end_date)
        .unwrap_or(today);

    if start >= end {
        warn!(%start, %end, "empty date range, nothing will be forecast");
    }
    Ok((start, end))
}

/// Run the whole job described by `config` and `args`
pub fn run_job(config: &JobConfig, args: &Args) -> Result<RunSummary> {
    let started = Instant::now();
    let (start, end) = date_range(config, args, Local::now().date_naive())?;

    let tables = DataLoader::load_tables(
        &config.sources.tables(),
        config.sources.origin.as_deref(),
        &ColumnConverters::standard(),
    )?;
    let runner = ForecastRunner::new(&tables, config.forecast.metric, &config.forecast.strategies)?;

    let mut sink = open_sink(&config.output, &runner.labels())?;
    if args.verbose {
        sink = Box::new(EchoSink::new(sink));
    }
    info!(path = %config.output.path.display(), format = ?config.output.format, "writing forecasts");

    let summary = runner.run(start, end, &mut sink)?;
    drop(sink);

    if let Some(path) = &config.output.summary {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &summary)?;
        info!(path = %path.display(), "wrote run summary");
    }

    info!(elapsed = ?started.elapsed(), "job finished");
    Ok(summary)
}
