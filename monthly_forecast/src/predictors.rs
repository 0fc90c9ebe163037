//! Partial-month predictors
//!
//! Every predictor answers the same question: given the month-to-date value
//! on a target day, what will the month's final total be? They differ in
//! which historical completion ratio they scale that value by.
//!
//! - [`WeightedRatioPredictor`]: the ratio observed on the same day one and
//!   two years back, blended by a weight
//! - [`PastMonthPredictor`]: the ratio observed at the same distance from
//!   month end in the previous month
//!
//! The set of strategies a run can use is closed and described by
//! [`Strategy`], which is what configuration deserializes into.

use crate::error::{ForecastError, LookupError, Result};
use crate::metrics::Evaluation;
use crate::row::Metric;
use crate::table::TableSet;
use chrono::NaiveDate;
use month_math::{absolute_error, percent_error, relative_error};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, warn};

pub mod lookup;
pub mod past_month;
pub mod ratio;

pub use past_month::PastMonthPredictor;
pub use ratio::WeightedRatioPredictor;

/// Common interface for partial-month predictors
///
/// Implementors provide [`Predictor::try_predict`]; everything else is
/// derived from it and from the monthly table. All methods are pure
/// functions of the borrowed tables and the target day.
pub trait Predictor: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Tables the predictor reads
    fn tables(&self) -> &TableSet;

    /// Metric being forecast
    fn metric(&self) -> Metric;

    /// Forecast the final monthly total for `day`'s month, or say why not
    fn try_predict(&self, day: NaiveDate) -> std::result::Result<f64, LookupError>;

    /// Forecast the final monthly total for `day`'s month.
    ///
    /// Lookup failures are logged and reported as `None`, as are
    /// non-finite results.
    fn predict(&self, day: NaiveDate) -> Option<f64> {
        match self.try_predict(day) {
            Ok(forecast) if forecast.is_finite() => Some(forecast),
            Ok(forecast) => {
                warn!(predictor = self.name(), %day, forecast, "discarding non-finite forecast");
                None
            }
            Err(err) => {
                error!(predictor = self.name(), %day, error = %err, "unable to forecast");
                None
            }
        }
    }

    /// Actual final total for `day`'s month, once the month has closed
    fn monthly_actual(&self, day: NaiveDate) -> Option<f64> {
        lookup::monthly_value(self.tables(), self.metric(), day)
            .map_err(|err| {
                debug!(predictor = self.name(), %day, error = %err, "no monthly actual");
            })
            .ok()
    }

    /// Forecast minus actual
    fn absolute_error(&self, day: NaiveDate) -> Option<f64> {
        let forecast = self.predict(day)?;
        let actual = self.monthly_actual(day)?;
        Some(absolute_error(forecast, actual))
    }

    /// Absolute error over actual; `None` when the actual is zero
    fn relative_error(&self, day: NaiveDate) -> Option<f64> {
        let absolute = self.absolute_error(day)?;
        relative_error(absolute, self.monthly_actual(day)?)
    }

    /// Relative error as a percentage
    fn percent_error(&self, day: NaiveDate) -> Option<f64> {
        self.relative_error(day).map(percent_error)
    }

    /// Forecast, actual and all error metrics for `day`, predicting once
    fn evaluate(&self, day: NaiveDate) -> Evaluation {
        Evaluation::from_values(self.predict(day), self.monthly_actual(day))
    }
}

/// The strategies a run can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Same-day ratio one year back
    RatioOneYear,
    /// Even blend of the same-day ratios one and two years back
    RatioTwoYearAverage,
    /// Blend of the same-day ratios one and two years back with a custom weight
    RatioWeightedAverage { weight: f64 },
    /// Ratio at the same distance from month end in the previous month
    PastMonth,
}

impl Strategy {
    /// Strategies used when none are configured
    pub fn defaults() -> Vec<Strategy> {
        vec![Strategy::RatioOneYear, Strategy::RatioTwoYearAverage]
    }

    /// Short label used for output columns
    pub fn label(&self) -> String {
        match self {
            Strategy::RatioOneYear => "w_1y".to_string(),
            Strategy::RatioTwoYearAverage => "w_2y".to_string(),
            Strategy::RatioWeightedAverage { weight } => format!("w_{}", weight),
            Strategy::PastMonth => "prev_month".to_string(),
        }
    }

    /// Build the predictor for this strategy over `tables`
    pub fn build<'a>(&self, tables: &'a TableSet, metric: Metric) -> Result<Box<dyn Predictor + 'a>> {
        let predictor: Box<dyn Predictor + 'a> = match *self {
            Strategy::RatioOneYear => {
                Box::new(WeightedRatioPredictor::one_year(tables).with_metric(metric))
            }
            Strategy::RatioTwoYearAverage => {
                Box::new(WeightedRatioPredictor::two_year_average(tables).with_metric(metric))
            }
            Strategy::RatioWeightedAverage { weight } => {
                Box::new(WeightedRatioPredictor::new(tables, weight)?.with_metric(metric))
            }
            Strategy::PastMonth => Box::new(PastMonthPredictor::new(tables).with_metric(metric)),
        };
        Ok(predictor)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl std::str::FromStr for Strategy {
    type Err = ForecastError;

    /// Parses the labels produced by [`Strategy::label`]
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "w_1y" => Ok(Strategy::RatioOneYear),
            "w_2y" => Ok(Strategy::RatioTwoYearAverage),
            "prev_month" => Ok(Strategy::PastMonth),
            other => other
                .strip_prefix("w_")
                .and_then(|weight| weight.parse::<f64>().ok())
                .map(|weight| Strategy::RatioWeightedAverage { weight })
                .ok_or_else(|| ForecastError::InvalidParameter(format!("Unknown strategy: {}", s))),
        }
    }
}
