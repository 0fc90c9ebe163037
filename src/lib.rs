//! # Monthly Forecast Workspace
//!
//! Umbrella crate re-exporting the workspace members:
//!
//! - [`month_math`]: calendar arithmetic, ratio blending and error metrics
//! - [`monthly_forecast`]: tables, predictors and the forecast runner
//! - [`forecast_job`]: configuration, logging and file sinks of the batch job
//!
//! ## Example
//!
//! ```
//! use monthly_forecast_workspace::prelude::*;
//! use chrono::NaiveDate;
//!
//! let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! assert_eq!(month_end_of(day).unwrap(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
//! assert_eq!(Strategy::defaults()[0].label(), "w_1y");
//! ```

pub use forecast_job;
pub use month_math;
pub use monthly_forecast;

/// The types most runs need
pub mod prelude {
    pub use forecast_job::config::JobConfig;
    pub use month_math::{date_range, month_end_of, AccuracySummary};
    pub use monthly_forecast::{
        DataLoader, ForecastRecord, ForecastRunner, ForecastSink, MemorySink, Metric, Predictor,
        Row, Strategy, TableKind, TableSet, TimeSeriesTable,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_run_through_facade() {
        let tables = TableSet::new(
            TimeSeriesTable::new(TableKind::Daily, vec![]),
            TimeSeriesTable::new(
                TableKind::PartialMonth,
                vec![Row::new(date(2023, 3, 15), 300.0), Row::new(date(2024, 3, 15), 330.0)],
            ),
            TimeSeriesTable::new(TableKind::Monthly, vec![Row::new(date(2023, 3, 31), 1000.0)]),
        )
        .unwrap();
        let runner =
            ForecastRunner::new(&tables, Metric::Users, &[Strategy::RatioOneYear]).unwrap();
        let mut sink = MemorySink::new();

        let summary = runner.run(date(2024, 3, 15), date(2024, 3, 16), &mut sink).unwrap();

        assert_eq!(summary.written, 1);
        let forecast = sink.records()[0].forecast("w_1y").unwrap().forecast.unwrap();
        assert!((forecast - 1100.0).abs() < 1e-9);
    }
}
