//! Error types for the monthly_forecast crate
//!
//! [`ForecastError`] aborts a run: malformed source data, bad parameters,
//! I/O. [`LookupError`] is the non-fatal kind: a predictor could not find
//! the rows it needs for one target day, the failure is logged and the
//! forecast for that day is reported as missing.

use crate::row::Metric;
use crate::table::TableKind;
use chrono::NaiveDate;
use month_math::MathError;
use thiserror::Error;

/// Custom error types for the monthly_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A raw field could not be converted to its declared column type
    #[error("Conversion error in {table} row {row}, column '{column}': {value:?} ({reason})")]
    Conversion {
        table: TableKind,
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// A required column is absent from a raw row
    #[error("Missing column '{column}' in {table} row {row}")]
    MissingColumn {
        table: TableKind,
        row: usize,
        column: String,
    },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from calendar arithmetic
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Reasons a forecast or actual could not be looked up for a day
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// Zero or several rows matched where exactly one is required
    #[error("expected exactly one {table} row on {date}, found {found}")]
    LookupFailure {
        table: TableKind,
        date: NaiveDate,
        found: usize,
    },

    /// The matching row has no value for the requested metric
    #[error("{table} row on {date} has no {metric} value")]
    MissingMetric {
        table: TableKind,
        date: NaiveDate,
        metric: Metric,
    },

    /// A partial/monthly ratio would divide by zero or is not finite
    #[error("degenerate ratio on {date}: partial {partial} over monthly {monthly}")]
    DegenerateRatio {
        date: NaiveDate,
        partial: f64,
        monthly: f64,
    },

    /// No reference ratio one year back, so there is nothing to blend
    #[error("no history to forecast {day}: one year back ({one_year}) unavailable, two years back ({two_years}) {}", availability(.two_years_available))]
    MissingHistory {
        day: NaiveDate,
        one_year: NaiveDate,
        two_years: NaiveDate,
        two_years_available: bool,
        #[source]
        source: Box<LookupError>,
    },

    /// A reference day could not be computed
    #[error("calendar error: {0}")]
    Calendar(#[from] MathError),
}

fn availability(available: &bool) -> &'static str {
    if *available {
        "available"
    } else {
        "unavailable"
    }
}
