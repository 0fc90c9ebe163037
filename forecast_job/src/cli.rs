//! Command-line arguments of `monthly_forecast_job`

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Forecast end-of-month totals for every day of a date range
#[derive(Debug, Default, Parser)]
#[command(name = "monthly_forecast_job", version, about)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "MONTHLY_FORECAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// First day to forecast (ISO-8601)
    #[arg(short, long)]
    pub start_date: Option<NaiveDate>,

    /// Day after the last one to forecast (ISO-8601); an invalid date means today
    #[arg(short, long)]
    pub end_date: Option<String>,

    /// Print every record to stdout
    #[arg(short, long)]
    pub verbose: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// End date given on the command line, if any
    pub fn end_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.end_date.as_deref().map(|raw| lenient_date(raw, today))
    }
}

/// Parse an ISO-8601 date, falling back to `today` when it is not one
pub fn lenient_date(raw: &str, today: NaiveDate) -> NaiveDate {
    match raw.trim().parse::<NaiveDate>() {
        Ok(date) => date,
        Err(_) => {
            info!(end_date = raw, %today, "not a valid ISO-8601 date, defaulting to today");
            today
        }
    }
}
