//! # Monthly Forecast
//!
//! Forecasts the end-of-month total of a cumulative metric (such as
//! `Users`) while the month is still in progress.
//!
//! ## How it works
//!
//! The partial-month table holds, for every day, the month-to-date total.
//! The monthly table holds each month's final total. On any past day the
//! ratio `partial / monthly` tells how much of the month's eventual total
//! had accumulated by then. Predictors look that ratio up in a reference
//! period and use it to scale today's month-to-date value:
//!
//! - **Year over year**: the same day one and two years back, blended by a
//!   weight (`w = 1` one year only, `w = 0.5` even average); today's value is
//!   divided by the blended ratio
//! - **Past month**: the same distance from month end in the previous
//!   month; today's value is multiplied by that ratio
//!
//! Missing history never aborts a run: the forecast for that day is `None`
//! and the reason is logged.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use monthly_forecast::{Predictor, Row, TableKind, TableSet, TimeSeriesTable};
//! use monthly_forecast::predictors::WeightedRatioPredictor;
//!
//! let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
//!
//! let partial = TimeSeriesTable::new(
//!     TableKind::PartialMonth,
//!     vec![Row::new(date(2022, 3, 15), 300.0), Row::new(date(2023, 3, 15), 330.0)],
//! );
//! let monthly = TimeSeriesTable::new(TableKind::Monthly, vec![Row::new(date(2022, 3, 31), 1000.0)]);
//! let daily = TimeSeriesTable::new(TableKind::Daily, vec![]);
//! let tables = TableSet::new(daily, partial, monthly)?;
//!
//! let predictor = WeightedRatioPredictor::one_year(&tables);
//! let forecast = predictor.predict(date(2023, 3, 15)).unwrap();
//! assert!((forecast - 1100.0).abs() < 1e-9);
//! # Ok::<(), monthly_forecast::ForecastError>(())
//! ```

pub mod data;
pub mod error;
pub mod metrics;
pub mod predictors;
pub mod row;
pub mod runner;
pub mod table;

// Re-export commonly used types
pub use crate::data::{DataLoader, TablePaths};
pub use crate::error::{ForecastError, LookupError};
pub use crate::metrics::{Evaluation, ForecastRecord, OptimalForecast, StrategyForecast};
pub use crate::predictors::{Predictor, Strategy};
pub use crate::row::{ColumnConverters, ColumnType, Metric, RawRow, Row};
pub use crate::runner::{ForecastRunner, ForecastSink, MemorySink, RunSummary};
pub use crate::table::{TableKind, TableSet, TimeSeriesTable};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
