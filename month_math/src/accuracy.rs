//! Error metrics for closed months
//!
//! The scalar helpers compare one forecast with the actual monthly total.
//! [`AccuracySummary`] aggregates them over a run of target days.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Forecast minus actual
pub fn absolute_error(forecast: f64, actual: f64) -> f64 {
    forecast - actual
}

/// Absolute error relative to the actual total.
///
/// Returns `None` when the actual total is zero, so no infinite or NaN
/// value leaves this function.
pub fn relative_error(absolute_error: f64, actual: f64) -> Option<f64> {
    if actual == 0.0 {
        return None;
    }

    let relative = absolute_error / actual;
    relative.is_finite().then_some(relative)
}

/// Relative error expressed as a percentage
pub fn percent_error(relative_error: f64) -> f64 {
    100.0 * relative_error
}

/// Aggregate accuracy of a strategy over several target days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    /// Number of (forecast, actual) pairs
    pub count: usize,
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error over pairs with a non-zero actual
    pub mape: Option<f64>,
    /// Mean signed error (forecast minus actual)
    pub bias: f64,
}

impl AccuracySummary {
    /// Summarize `(forecast, actual)` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(MathError::InsufficientData(
                "At least one forecast/actual pair is required".to_string(),
            ));
        }

        let n = pairs.len() as f64;
        let errors: Vec<f64> = pairs
            .iter()
            .map(|&(forecast, actual)| absolute_error(forecast, actual))
            .collect();

        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let rmse = (errors.iter().map(|e| e.powi(2)).sum::<f64>() / n).sqrt();
        let bias = errors.iter().sum::<f64>() / n;

        let percentages: Vec<f64> = pairs
            .iter()
            .zip(errors.iter())
            .filter_map(|(&(_, actual), &error)| relative_error(error, actual))
            .map(|relative| percent_error(relative).abs())
            .collect();
        let mape = if percentages.is_empty() {
            None
        } else {
            Some(percentages.iter().sum::<f64>() / percentages.len() as f64)
        };

        Ok(Self {
            count: pairs.len(),
            mae,
            rmse,
            mape,
            bias,
        })
    }
}

impl std::fmt::Display for AccuracySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} MAE={:.4} RMSE={:.4} bias={:.4}",
            self.count, self.mae, self.rmse, self.bias
        )?;
        match self.mape {
            Some(mape) => write!(f, " MAPE={:.4}%", mape),
            None => write!(f, " MAPE=n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scalar_errors() {
        let abs = absolute_error(550.0, 500.0);
        assert_relative_eq!(abs, 50.0);

        let rel = relative_error(abs, 500.0).unwrap();
        assert_relative_eq!(rel, 0.1, epsilon = 1e-12);
        assert_relative_eq!(percent_error(rel), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_relative_error_zero_actual() {
        assert_eq!(relative_error(50.0, 0.0), None);
        assert_eq!(relative_error(0.0, 0.0), None);
    }

    #[test]
    fn test_summary() {
        let summary = AccuracySummary::from_pairs(&[(110.0, 100.0), (90.0, 100.0), (200.0, 200.0)])
            .unwrap();

        assert_eq!(summary.count, 3);
        assert_relative_eq!(summary.mae, 20.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(summary.rmse, (200.0_f64 / 3.0).sqrt(), epsilon = 1e-9);
        assert_relative_eq!(summary.bias, 0.0, epsilon = 1e-9);
        assert_relative_eq!(summary.mape.unwrap(), 20.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_summary_skips_zero_actuals_for_mape() {
        let summary = AccuracySummary::from_pairs(&[(10.0, 0.0)]).unwrap();
        assert_eq!(summary.mape, None);
        assert_relative_eq!(summary.mae, 10.0);
        assert!(summary.to_string().contains("MAPE=n/a"));
    }

    #[test]
    fn test_summary_requires_data() {
        assert!(matches!(
            AccuracySummary::from_pairs(&[]),
            Err(MathError::InsufficientData(_))
        ));
    }
}
