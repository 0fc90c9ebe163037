//! Forecast evaluation and the records handed to the output layer

use crate::row::Metric;
use chrono::{NaiveDate, NaiveDateTime};
use month_math::{absolute_error, percent_error, relative_error};
use serde::{Deserialize, Serialize};

/// A forecast together with its error against the actual monthly total
///
/// Error metrics are `None` until the month has closed and the actual is
/// known, and whenever the forecast itself is missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    pub forecast: Option<f64>,
    pub monthly_actual: Option<f64>,
    pub absolute_error: Option<f64>,
    pub relative_error: Option<f64>,
    pub percent_error: Option<f64>,
}

impl Evaluation {
    /// Derive the error metrics from a forecast and an actual total
    pub fn from_values(forecast: Option<f64>, monthly_actual: Option<f64>) -> Self {
        let absolute = forecast
            .zip(monthly_actual)
            .map(|(forecast, actual)| absolute_error(forecast, actual));
        let relative = absolute
            .zip(monthly_actual)
            .and_then(|(absolute, actual)| relative_error(absolute, actual));

        Self {
            forecast,
            monthly_actual,
            absolute_error: absolute,
            relative_error: relative,
            percent_error: relative.map(percent_error),
        }
    }
}

/// One strategy's contribution to a [`ForecastRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyForecast {
    /// Strategy label, e.g. `w_1y`
    pub strategy: String,
    pub forecast: Option<f64>,
    pub absolute_error: Option<f64>,
    pub relative_error: Option<f64>,
    pub percent_error: Option<f64>,
}

impl StrategyForecast {
    pub fn new(strategy: impl Into<String>, evaluation: &Evaluation) -> Self {
        Self {
            strategy: strategy.into(),
            forecast: evaluation.forecast,
            absolute_error: evaluation.absolute_error,
            relative_error: evaluation.relative_error,
            percent_error: evaluation.percent_error,
        }
    }
}

/// Forecast with a weight fitted to historical squared error.
///
/// Weight fitting is not implemented. Records carry this marker, written
/// out as a `0.0` forecast with a `0.0` weight. It is not a failed forecast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimalForecast {
    #[default]
    NotImplemented,
}

impl OptimalForecast {
    /// Value written in place of the forecast
    pub fn forecast(&self) -> f64 {
        match self {
            OptimalForecast::NotImplemented => 0.0,
        }
    }

    /// Value written in place of the fitted weight
    pub fn weight(&self) -> f64 {
        match self {
            OptimalForecast::NotImplemented => 0.0,
        }
    }
}

/// Everything forecast for one target day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Target day as `YYYYMMDD`
    pub ukey: String,
    pub target_date: NaiveDate,
    /// Last day of the target month
    pub fecha_filtro: NaiveDate,
    pub metric: Metric,
    /// Actual total, once the month has closed
    pub monthly_actual: Option<f64>,
    /// One entry per configured strategy, in configuration order
    pub forecasts: Vec<StrategyForecast>,
    pub optimal: OptimalForecast,
    pub created_at: NaiveDateTime,
}

impl ForecastRecord {
    /// Unique key of a target day
    pub fn ukey_for(day: NaiveDate) -> String {
        day.format("%Y%m%d").to_string()
    }

    /// The entry of the strategy labelled `label`
    pub fn forecast(&self, label: &str) -> Option<&StrategyForecast> {
        self.forecasts.iter().find(|entry| entry.strategy == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_evaluation_with_actual() {
        let evaluation = Evaluation::from_values(Some(550.0), Some(500.0));

        assert_relative_eq!(evaluation.absolute_error.unwrap(), 50.0);
        assert_relative_eq!(evaluation.relative_error.unwrap(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(evaluation.percent_error.unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_evaluation_without_actual() {
        let evaluation = Evaluation::from_values(Some(550.0), None);

        assert_eq!(evaluation.forecast, Some(550.0));
        assert_eq!(evaluation.absolute_error, None);
        assert_eq!(evaluation.relative_error, None);
        assert_eq!(evaluation.percent_error, None);
    }

    #[test]
    fn test_evaluation_zero_actual() {
        let evaluation = Evaluation::from_values(Some(10.0), Some(0.0));

        assert_eq!(evaluation.absolute_error, Some(10.0));
        assert_eq!(evaluation.relative_error, None);
        assert_eq!(evaluation.percent_error, None);
    }

    #[test]
    fn test_placeholder_is_zero_not_missing() {
        let optimal = OptimalForecast::default();
        assert_eq!(optimal.forecast(), 0.0);
        assert_eq!(optimal.weight(), 0.0);
    }

    #[test]
    fn test_ukey() {
        let day = NaiveDate::from_ymd_opt(2023, 3, 5).unwrap();
        assert_eq!(ForecastRecord::ukey_for(day), "20230305");
    }
}
