//! # Month Math
//!
//! Mathematical building blocks for monthly cumulative forecasts.
//! This crate provides the calendar arithmetic used to locate reference
//! days, the weighted blending of completion ratios, and the error metrics
//! computed once a month has closed.

use thiserror::Error;

pub mod accuracy;
pub mod blend;
pub mod calendar;

pub use accuracy::{absolute_error, percent_error, relative_error, AccuracySummary};
pub use blend::{blend_ratios, validate_weight, Blend};
pub use calendar::{
    date_range, days_to_month_end, month_end_of, month_start_of, prior_month_equivalent_day,
    years_before, DateRange,
};

/// Errors that can occur in monthly forecast calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),
}

/// Result type for monthly forecast math
pub type Result<T> = std::result::Result<T, MathError>;
