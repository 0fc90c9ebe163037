//! Running strategies over a range of target days

use crate::error::{ForecastError, Result};
use crate::metrics::{Evaluation, ForecastRecord, OptimalForecast, StrategyForecast};
use crate::predictors::{lookup, Predictor, Strategy};
use crate::row::Metric;
use crate::table::TableSet;
use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use month_math::{date_range, month_end_of, AccuracySummary};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info};

/// Destination for forecast records
pub trait ForecastSink {
    /// Persist one record
    fn write(&mut self, record: &ForecastRecord) -> Result<()>;

    /// Make everything written so far durable
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: ForecastSink + ?Sized> ForecastSink for Box<S> {
    fn write(&mut self, record: &ForecastRecord) -> Result<()> {
        (**self).write(record)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Sink that keeps records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<ForecastRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written so far
    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ForecastRecord> {
        self.records
    }
}

impl ForecastSink for MemorySink {
    fn write(&mut self, record: &ForecastRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Accuracy of one strategy over a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAccuracy {
    pub strategy: String,
    /// Days with a forecast
    pub forecasts: usize,
    /// Error summary over days with both a forecast and an actual
    pub summary: Option<AccuracySummary>,
}

/// Outcome of [`ForecastRunner::run`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Target days processed
    pub days: usize,
    /// Records accepted by the sink
    pub written: usize,
    /// Records the sink rejected
    pub sink_failures: usize,
    /// Per-strategy accuracy, in configuration order
    pub accuracy: Vec<StrategyAccuracy>,
}

/// Runs the configured strategies for each target day
pub struct ForecastRunner<'a> {
    tables: &'a TableSet,
    metric: Metric,
    predictors: Vec<(String, Box<dyn Predictor + 'a>)>,
}

impl<'a> ForecastRunner<'a> {
    /// Build one predictor per strategy over `tables`
    pub fn new(tables: &'a TableSet, metric: Metric, strategies: &[Strategy]) -> Result<Self> {
        if strategies.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one strategy is required".to_string(),
            ));
        }

        let mut labels = HashSet::new();
        let mut predictors = Vec::with_capacity(strategies.len());
        for strategy in strategies {
            let label = strategy.label();
            if !labels.insert(label.clone()) {
                return Err(ForecastError::InvalidParameter(format!(
                    "Strategy {} configured twice",
                    label
                )));
            }
            predictors.push((label, strategy.build(tables, metric)?));
        }

        Ok(Self {
            tables,
            metric,
            predictors,
        })
    }

    /// Labels of the configured strategies, in order
    pub fn labels(&self) -> Vec<&str> {
        self.predictors
            .iter()
            .map(|(label, _)| label.as_str())
            .collect()
    }

    /// Forecast every strategy for `day`
    pub fn forecast_day(&self, day: NaiveDate, created_at: NaiveDateTime) -> Result<ForecastRecord> {
        let fecha_filtro = month_end_of(day)?;
        let monthly_actual = match lookup::monthly_value(self.tables, self.metric, day) {
            Ok(actual) => Some(actual),
            Err(err) => {
                debug!(%day, error = %err, "month has no actual total yet");
                None
            }
        };

        let forecasts = self
            .predictors
            .iter()
            .map(|(label, predictor)| {
                let evaluation = Evaluation::from_values(predictor.predict(day), monthly_actual);
                StrategyForecast::new(label.clone(), &evaluation)
            })
            .collect();

        Ok(ForecastRecord {
            ukey: ForecastRecord::ukey_for(day),
            target_date: day,
            fecha_filtro,
            metric: self.metric,
            monthly_actual,
            forecasts,
            optimal: OptimalForecast::NotImplemented,
            created_at,
        })
    }

    /// Forecast every day in `[start, end)` and write each record to `sink`.
    ///
    /// A record the sink rejects is logged and counted; the run continues.
    /// A failed final flush is returned as an error.
    pub fn run<S>(&self, start: NaiveDate, end: NaiveDate, sink: &mut S) -> Result<RunSummary>
    where
        S: ForecastSink + ?Sized,
    {
        info!(%start, %end, metric = %self.metric, strategies = ?self.labels(), "starting forecast run");

        let mut days = 0;
        let mut written = 0;
        let mut sink_failures = 0;
        let mut pairs: Vec<Vec<(f64, f64)>> = vec![Vec::new(); self.predictors.len()];
        let mut forecast_counts = vec![0usize; self.predictors.len()];

        for day in date_range(start, end) {
            let created_at = Local::now().naive_local().trunc_subsecs(3);
            let record = self.forecast_day(day, created_at)?;
            days += 1;

            for (index, entry) in record.forecasts.iter().enumerate() {
                if let Some(forecast) = entry.forecast {
                    forecast_counts[index] += 1;
                    if let Some(actual) = record.monthly_actual {
                        pairs[index].push((forecast, actual));
                    }
                }
            }

            match sink.write(&record) {
                Ok(()) => written += 1,
                Err(err) => {
                    error!(ukey = %record.ukey, error = %err, "failed to write forecast record");
                    sink_failures += 1;
                }
            }
        }

        sink.flush()?;

        let accuracy = self
            .predictors
            .iter()
            .zip(pairs.iter().zip(forecast_counts))
            .map(|((label, _), (pairs, forecasts))| StrategyAccuracy {
                strategy: label.clone(),
                forecasts,
                summary: AccuracySummary::from_pairs(pairs).ok(),
            })
            .collect::<Vec<_>>();

        for entry in &accuracy {
            match &entry.summary {
                Some(summary) => info!(strategy = %entry.strategy, forecasts = entry.forecasts, "{}", summary),
                None => info!(strategy = %entry.strategy, forecasts = entry.forecasts, "no closed months to score"),
            }
        }
        info!(days, written, sink_failures, "forecast run finished");

        Ok(RunSummary {
            days,
            written,
            sink_failures,
            accuracy,
        })
    }
}
