//! Year-over-year ratio predictor

use super::{lookup, Predictor};
use crate::error::{LookupError, Result};
use crate::row::Metric;
use crate::table::TableSet;
use chrono::NaiveDate;
use month_math::{blend_ratios, validate_weight, years_before, Blend};
use tracing::debug;

/// Forecasts from the completion ratio observed on the same calendar day
/// one and two years back.
///
/// With ratios `r1` (one year back) and `r2` (two years back) and weight
/// `w`, the blended ratio is `w·r1 + (1 − w)·r2` and the forecast is the
/// month-to-date value divided by it. When only `r1` exists it is used
/// as is, whatever the weight.
///
/// A ratio of zero is still history: an `r2` of `0` is blended in rather
/// than falling back to `r1` alone, and an `r1` of `0` yields a
/// non-finite forecast that [`Predictor::predict`] reports as `None`.
#[derive(Debug, Clone)]
pub struct WeightedRatioPredictor<'a> {
    name: String,
    tables: &'a TableSet,
    metric: Metric,
    weight: f64,
}

impl<'a> WeightedRatioPredictor<'a> {
    /// Create a predictor with a custom weight in `[0, 1]`
    pub fn new(tables: &'a TableSet, weight: f64) -> Result<Self> {
        let weight = validate_weight(weight)?;
        Ok(Self::with_weight(
            tables,
            weight,
            format!("ratio_weighted_average(w={})", weight),
        ))
    }

    /// Only the ratio one year back (`w = 1`)
    pub fn one_year(tables: &'a TableSet) -> Self {
        Self::with_weight(tables, 1.0, "ratio_one_year".to_string())
    }

    /// Even blend of both years (`w = 0.5`)
    pub fn two_year_average(tables: &'a TableSet) -> Self {
        Self::with_weight(tables, 0.5, "ratio_two_year_average".to_string())
    }

    fn with_weight(tables: &'a TableSet, weight: f64, name: String) -> Self {
        Self {
            name,
            tables,
            metric: Metric::default(),
            weight,
        }
    }

    /// Forecast a different metric
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Weight given to the ratio one year back
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Partial/monthly ratio on `day`
    pub fn ratio(&self, day: NaiveDate) -> std::result::Result<f64, LookupError> {
        lookup::partial_monthly_ratio(self.tables, self.metric, day)
    }

    /// Blended reference ratio for `day`
    pub fn blended_ratio(&self, day: NaiveDate) -> std::result::Result<Blend, LookupError> {
        let one_year = years_before(day, 1)?;
        let two_years = years_before(day, 2)?;

        let r1 = self.ratio(one_year);
        let r2 = self.ratio(two_years);

        if let Err(err) = &r2 {
            debug!(predictor = %self.name, %day, reference = %two_years, error = %err, "second reference year unavailable");
        }

        let r1 = r1.map_err(|err| LookupError::MissingHistory {
            day,
            one_year,
            two_years,
            two_years_available: r2.is_ok(),
            source: Box::new(err),
        })?;

        let blend = blend_ratios(self.weight, r1, r2.ok());
        if let Blend::OneYearOnly(_) = blend {
            debug!(predictor = %self.name, %day, weight = self.weight, "weight ignored, using one year of history");
        }
        Ok(blend)
    }
}

impl Predictor for WeightedRatioPredictor<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn tables(&self) -> &TableSet {
        self.tables
    }

    fn metric(&self) -> Metric {
        self.metric
    }

    fn try_predict(&self, day: NaiveDate) -> std::result::Result<f64, LookupError> {
        let blend = self.blended_ratio(day)?;
        let partial = lookup::partial_value(self.tables, self.metric, day)?;
        Ok(partial / blend.ratio())
    }
}
