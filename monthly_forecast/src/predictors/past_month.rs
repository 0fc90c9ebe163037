//! Previous-month ratio predictor

use super::{lookup, Predictor};
use crate::error::LookupError;
use crate::row::Metric;
use crate::table::TableSet;
use chrono::NaiveDate;
use month_math::prior_month_equivalent_day;

/// Forecasts from the completion ratio of the immediately preceding month.
///
/// The reference day sits as many days before the previous month's end as
/// the target day sits before its own month end. The month-to-date value
/// is then *multiplied* by that month's partial/monthly ratio, unlike
/// [`super::WeightedRatioPredictor`], which divides.
#[derive(Debug, Clone)]
pub struct PastMonthPredictor<'a> {
    tables: &'a TableSet,
    metric: Metric,
}

impl<'a> PastMonthPredictor<'a> {
    pub fn new(tables: &'a TableSet) -> Self {
        Self {
            tables,
            metric: Metric::default(),
        }
    }

    /// Forecast a different metric
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Partial/monthly ratio at the equivalent day of the previous month
    pub fn prior_ratio(&self, day: NaiveDate) -> Result<f64, LookupError> {
        let prior_day = prior_month_equivalent_day(day)?;
        lookup::partial_monthly_ratio(self.tables, self.metric, prior_day)
    }
}

impl Predictor for PastMonthPredictor<'_> {
    fn name(&self) -> &str {
        "past_month"
    }

    fn tables(&self) -> &TableSet {
        self.tables
    }

    fn metric(&self) -> Metric {
        self.metric
    }

    fn try_predict(&self, day: NaiveDate) -> Result<f64, LookupError> {
        let ratio = self.prior_ratio(day)?;
        let partial = lookup::partial_value(self.tables, self.metric, day)?;
        Ok(partial * ratio)
    }
}
