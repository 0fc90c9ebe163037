use approx::assert_relative_eq;
use chrono::NaiveDate;
use month_math::Blend;
use monthly_forecast::predictors::{PastMonthPredictor, WeightedRatioPredictor};
use monthly_forecast::{
    ForecastError, LookupError, Metric, Predictor, Row, Strategy, TableKind, TableSet,
    TimeSeriesTable,
};
use rstest::rstest;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn tables(partial: &[(NaiveDate, f64)], monthly: &[(NaiveDate, f64)]) -> TableSet {
    let rows = |values: &[(NaiveDate, f64)]| {
        values
            .iter()
            .map(|&(day, users)| Row::new(day, users))
            .collect::<Vec<_>>()
    };

    TableSet::new(
        TimeSeriesTable::new(TableKind::Daily, vec![]),
        TimeSeriesTable::new(TableKind::PartialMonth, rows(partial)),
        TimeSeriesTable::new(TableKind::Monthly, rows(monthly)),
    )
    .unwrap()
}

/// March 15th 2024 with ratio 0.4 one year back and 0.2 two years back
fn two_years_of_history(today: f64) -> TableSet {
    tables(
        &[
            (date(2022, 3, 15), 200.0),
            (date(2023, 3, 15), 400.0),
            (date(2024, 3, 15), today),
        ],
        &[(date(2022, 3, 31), 1000.0), (date(2023, 3, 31), 1000.0)],
    )
}

#[test]
fn test_ratio() {
    let tables = tables(&[(date(2023, 3, 15), 300.0)], &[(date(2023, 3, 31), 1000.0)]);
    let predictor = WeightedRatioPredictor::one_year(&tables);

    assert_relative_eq!(predictor.ratio(date(2023, 3, 15)).unwrap(), 0.3, epsilon = 1e-12);
}

#[test]
fn test_weighted_blend_with_both_years() {
    let tables = two_years_of_history(150.0);
    let predictor = WeightedRatioPredictor::two_year_average(&tables);

    let blend = predictor.blended_ratio(date(2024, 3, 15)).unwrap();
    assert_relative_eq!(blend.ratio(), 0.3, epsilon = 1e-12);
    assert_relative_eq!(predictor.predict(date(2024, 3, 15)).unwrap(), 500.0, epsilon = 1e-9);
}

#[test]
fn test_one_year_ignores_second_year() {
    let tables = two_years_of_history(150.0);
    let predictor = WeightedRatioPredictor::one_year(&tables);

    assert_relative_eq!(predictor.predict(date(2024, 3, 15)).unwrap(), 375.0, epsilon = 1e-9);
}

#[rstest]
#[case(0.0)]
#[case(0.3)]
#[case(0.5)]
#[case(1.0)]
fn test_graceful_degradation_to_one_year(#[case] weight: f64) {
    let tables = tables(
        &[(date(2023, 3, 15), 400.0), (date(2024, 3, 15), 150.0)],
        &[(date(2023, 3, 31), 1000.0)],
    );
    let predictor = WeightedRatioPredictor::new(&tables, weight).unwrap();

    assert_eq!(predictor.blended_ratio(date(2024, 3, 15)).unwrap().ratio(), 0.4);
    assert_relative_eq!(predictor.predict(date(2024, 3, 15)).unwrap(), 375.0, epsilon = 1e-9);
}

#[test]
fn test_total_failure_is_none() {
    let tables = tables(&[(date(2024, 3, 15), 150.0)], &[]);
    let predictor = WeightedRatioPredictor::two_year_average(&tables);

    assert_eq!(predictor.predict(date(2024, 3, 15)), None);
    assert_eq!(predictor.absolute_error(date(2024, 3, 15)), None);
    match predictor.try_predict(date(2024, 3, 15)) {
        Err(LookupError::MissingHistory {
            two_years_available,
            ..
        }) => assert!(!two_years_available),
        other => panic!("Expected MissingHistory, got {:?}", other),
    }
}

#[test]
fn test_second_year_alone_is_not_enough() {
    let tables = tables(
        &[(date(2022, 3, 15), 200.0), (date(2024, 3, 15), 150.0)],
        &[(date(2022, 3, 31), 1000.0)],
    );
    let predictor = WeightedRatioPredictor::two_year_average(&tables);

    assert_eq!(predictor.predict(date(2024, 3, 15)), None);
    assert!(matches!(
        predictor.try_predict(date(2024, 3, 15)),
        Err(LookupError::MissingHistory {
            two_years_available: true,
            ..
        })
    ));
}

#[test]
fn test_missing_partial_for_target_day() {
    let tables = tables(&[(date(2023, 3, 15), 400.0)], &[(date(2023, 3, 31), 1000.0)]);
    let predictor = WeightedRatioPredictor::one_year(&tables);

    assert!(matches!(
        predictor.try_predict(date(2024, 3, 15)),
        Err(LookupError::LookupFailure {
            table: TableKind::PartialMonth,
            found: 0,
            ..
        })
    ));
    assert_eq!(predictor.predict(date(2024, 3, 15)), None);
}

#[test]
fn test_error_metrics() {
    let tables = tables(
        &[(date(2023, 3, 15), 400.0), (date(2024, 3, 15), 220.0)],
        &[(date(2023, 3, 31), 1000.0), (date(2024, 3, 31), 500.0)],
    );
    let predictor = WeightedRatioPredictor::one_year(&tables);
    let day = date(2024, 3, 15);

    assert_relative_eq!(predictor.predict(day).unwrap(), 550.0, epsilon = 1e-9);
    assert_eq!(predictor.monthly_actual(day), Some(500.0));
    assert_relative_eq!(predictor.absolute_error(day).unwrap(), 50.0, epsilon = 1e-9);
    assert_relative_eq!(predictor.relative_error(day).unwrap(), 0.1, epsilon = 1e-12);
    assert_relative_eq!(predictor.percent_error(day).unwrap(), 10.0, epsilon = 1e-9);

    let evaluation = predictor.evaluate(day);
    assert_relative_eq!(evaluation.percent_error.unwrap(), 10.0, epsilon = 1e-9);
}

#[test]
fn test_error_metrics_without_actual() {
    let tables = tables(
        &[(date(2023, 3, 15), 400.0), (date(2024, 3, 15), 220.0)],
        &[(date(2023, 3, 31), 1000.0)],
    );
    let predictor = WeightedRatioPredictor::one_year(&tables);
    let day = date(2024, 3, 15);

    assert!(predictor.predict(day).is_some());
    assert_eq!(predictor.monthly_actual(day), None);
    assert_eq!(predictor.absolute_error(day), None);
    assert_eq!(predictor.relative_error(day), None);
    assert_eq!(predictor.percent_error(day), None);
}

#[test]
fn test_zero_actual_has_no_relative_error() {
    let tables = tables(
        &[(date(2023, 3, 15), 400.0), (date(2024, 3, 15), 220.0)],
        &[(date(2023, 3, 31), 1000.0), (date(2024, 3, 31), 0.0)],
    );
    let predictor = WeightedRatioPredictor::one_year(&tables);
    let day = date(2024, 3, 15);

    assert!(predictor.absolute_error(day).is_some());
    assert_eq!(predictor.relative_error(day), None);
    assert_eq!(predictor.percent_error(day), None);
}

#[test]
fn test_past_month_multiplies_while_year_over_year_divides() {
    // 16 days to month end on 2024-03-15; February 2024 ends on the 29th,
    // so the equivalent day is 2024-02-13. Both reference ratios are 0.4.
    let tables = tables(
        &[
            (date(2023, 3, 15), 400.0),
            (date(2024, 2, 13), 400.0),
            (date(2024, 3, 15), 200.0),
        ],
        &[(date(2023, 3, 31), 1000.0), (date(2024, 2, 29), 1000.0)],
    );
    let day = date(2024, 3, 15);

    let past_month = PastMonthPredictor::new(&tables);
    let one_year = WeightedRatioPredictor::one_year(&tables);

    assert_relative_eq!(past_month.prior_ratio(day).unwrap(), 0.4, epsilon = 1e-12);
    assert_relative_eq!(one_year.ratio(date(2023, 3, 15)).unwrap(), 0.4, epsilon = 1e-12);

    assert_relative_eq!(past_month.predict(day).unwrap(), 80.0, epsilon = 1e-9);
    assert_relative_eq!(one_year.predict(day).unwrap(), 500.0, epsilon = 1e-9);
}

#[test]
fn test_past_month_reference_spills_into_earlier_month() {
    // 30 days to month end on 2023-03-01, February 2023 only has 28 days:
    // the reference day is 2023-01-29 and the monthly row is January's.
    let tables = tables(
        &[(date(2023, 1, 29), 900.0), (date(2023, 3, 1), 50.0)],
        &[(date(2023, 1, 31), 1000.0)],
    );
    let predictor = PastMonthPredictor::new(&tables);

    assert_relative_eq!(predictor.predict(date(2023, 3, 1)).unwrap(), 45.0, epsilon = 1e-9);
}

#[test]
fn test_past_month_missing_rows() {
    let tables = tables(&[(date(2024, 3, 15), 200.0)], &[(date(2024, 2, 29), 1000.0)]);
    let predictor = PastMonthPredictor::new(&tables);

    assert_eq!(predictor.predict(date(2024, 3, 15)), None);
}

#[test]
fn test_duplicate_rows_fail_lookup() {
    let tables = TableSet::new(
        TimeSeriesTable::new(TableKind::Daily, vec![]),
        TimeSeriesTable::new(
            TableKind::PartialMonth,
            vec![
                Row::new(date(2023, 3, 15), 400.0),
                Row::new(date(2023, 3, 15), 410.0),
                Row::new(date(2024, 3, 15), 150.0),
            ],
        ),
        TimeSeriesTable::new(
            TableKind::Monthly,
            vec![
                Row::new(date(2023, 3, 31), 1000.0),
                Row::new(date(2024, 3, 31), 500.0),
                Row::new(date(2024, 3, 31), 505.0),
            ],
        ),
    )
    .unwrap();
    let predictor = WeightedRatioPredictor::one_year(&tables);

    assert!(!tables.check_consistency());
    assert_eq!(predictor.predict(date(2024, 3, 15)), None);
    assert_eq!(predictor.monthly_actual(date(2024, 3, 15)), None);
    assert!(matches!(
        predictor.ratio(date(2023, 3, 15)),
        Err(LookupError::LookupFailure { found: 2, .. })
    ));
}

#[test]
fn test_zero_monthly_total_is_degenerate() {
    let tables = tables(
        &[(date(2023, 3, 15), 0.0), (date(2024, 3, 15), 150.0)],
        &[(date(2023, 3, 31), 0.0)],
    );
    let predictor = WeightedRatioPredictor::one_year(&tables);

    assert!(matches!(
        predictor.ratio(date(2023, 3, 15)),
        Err(LookupError::DegenerateRatio { .. })
    ));
    assert_eq!(predictor.predict(date(2024, 3, 15)), None);
}

#[test]
fn test_zero_reference_ratio_gives_no_forecast() {
    let tables = tables(
        &[(date(2023, 3, 15), 0.0), (date(2024, 3, 15), 150.0)],
        &[(date(2023, 3, 31), 1000.0)],
    );
    let predictor = WeightedRatioPredictor::one_year(&tables);

    assert_eq!(predictor.ratio(date(2023, 3, 15)).unwrap(), 0.0);
    assert_eq!(predictor.predict(date(2024, 3, 15)), None);
}

#[test]
fn test_zero_ratio_two_years_back_is_blended() {
    let tables = tables(
        &[
            (date(2022, 3, 15), 0.0),
            (date(2023, 3, 15), 400.0),
            (date(2024, 3, 15), 150.0),
        ],
        &[(date(2022, 3, 31), 1000.0), (date(2023, 3, 31), 1000.0)],
    );
    let predictor = WeightedRatioPredictor::two_year_average(&tables);

    let blend = predictor.blended_ratio(date(2024, 3, 15)).unwrap();
    assert!(matches!(blend, Blend::Weighted(_)));
    assert_relative_eq!(blend.ratio(), 0.2, epsilon = 1e-12);
    assert_relative_eq!(predictor.predict(date(2024, 3, 15)).unwrap(), 750.0, epsilon = 1e-9);
}

#[test]
fn test_leap_day_uses_february_28th() {
    let tables = tables(
        &[(date(2023, 2, 28), 1000.0), (date(2024, 2, 29), 1100.0)],
        &[(date(2023, 2, 28), 1000.0)],
    );
    let predictor = WeightedRatioPredictor::one_year(&tables);

    assert_relative_eq!(predictor.predict(date(2024, 2, 29)).unwrap(), 1100.0, epsilon = 1e-9);
}

#[test]
fn test_other_metric() {
    let partial = TimeSeriesTable::new(
        TableKind::PartialMonth,
        vec![
            Row::new(date(2023, 3, 15), 1.0).with_metric(Metric::Sessions, 250.0),
            Row::new(date(2024, 3, 15), 1.0).with_metric(Metric::Sessions, 100.0),
        ],
    );
    let monthly = TimeSeriesTable::new(
        TableKind::Monthly,
        vec![Row::new(date(2023, 3, 31), 1.0).with_metric(Metric::Sessions, 1000.0)],
    );
    let tables =
        TableSet::new(TimeSeriesTable::new(TableKind::Daily, vec![]), partial, monthly).unwrap();

    let sessions = WeightedRatioPredictor::one_year(&tables).with_metric(Metric::Sessions);
    assert_relative_eq!(sessions.predict(date(2024, 3, 15)).unwrap(), 400.0, epsilon = 1e-9);

    let pageviews = WeightedRatioPredictor::one_year(&tables).with_metric(Metric::Pageviews);
    assert_eq!(pageviews.predict(date(2024, 3, 15)), None);
}

#[test]
fn test_predict_is_idempotent() {
    let tables = two_years_of_history(150.0);
    let predictor = WeightedRatioPredictor::two_year_average(&tables);

    let first = predictor.predict(date(2024, 3, 15));
    let second = predictor.predict(date(2024, 3, 15));
    assert_eq!(first, second);
}

#[test]
fn test_predictors_share_tables_across_threads() {
    let tables = two_years_of_history(150.0);
    let predictors: Vec<Box<dyn Predictor + '_>> = Strategy::defaults()
        .iter()
        .map(|strategy| strategy.build(&tables, Metric::Users).unwrap())
        .collect();

    let forecasts: Vec<Option<f64>> = std::thread::scope(|scope| {
        let handles: Vec<_> = predictors
            .iter()
            .map(|predictor| scope.spawn(move || predictor.predict(date(2024, 3, 15))))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_relative_eq!(forecasts[0].unwrap(), 375.0, epsilon = 1e-9);
    assert_relative_eq!(forecasts[1].unwrap(), 500.0, epsilon = 1e-9);
}

#[test]
fn test_strategy_build_and_labels() {
    let tables = two_years_of_history(150.0);

    assert!(matches!(
        Strategy::RatioWeightedAverage { weight: 1.5 }.build(&tables, Metric::Users),
        Err(ForecastError::MathError(_))
    ));

    let weighted = Strategy::RatioWeightedAverage { weight: 0.25 };
    assert_eq!(weighted.label(), "w_0.25");
    assert_eq!("w_0.25".parse::<Strategy>().unwrap(), weighted);
    assert_eq!("prev_month".parse::<Strategy>().unwrap(), Strategy::PastMonth);
    assert!("median".parse::<Strategy>().is_err());
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_open_month_logs_at_debug() {
    let tables = two_years_of_history(150.0);
    let predictor = WeightedRatioPredictor::one_year(&tables);
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();

    let actual = tracing::subscriber::with_default(subscriber, || {
        predictor.monthly_actual(date(2024, 3, 15))
    });

    assert_eq!(actual, None);
    let text = logs.text();
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| line.contains("no monthly actual"))
        .collect();
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|line| line.contains("DEBUG")));
    assert!(!text.contains("WARN"));
}
