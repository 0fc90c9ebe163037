use chrono::NaiveDate;
use month_math::MathError;
use monthly_forecast::{ForecastError, LookupError, Metric, TableKind};
use std::error::Error;
use std::io;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);

    match forecast_error {
        ForecastError::IoError(_) => {}
        _ => panic!("Expected IoError variant"),
    }

    let math_error = MathError::InvalidInput("weight must be within [0, 1]".to_string());
    let forecast_error = ForecastError::from(math_error.clone());

    match forecast_error {
        ForecastError::MathError(inner) => assert_eq!(inner, math_error),
        _ => panic!("Expected MathError variant"),
    }
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("At least one strategy is required".to_string());
    assert!(error.to_string().contains("At least one strategy is required"));

    let error = ForecastError::Conversion {
        table: TableKind::PartialMonth,
        row: 7,
        column: "Users".to_string(),
        value: "abc".to_string(),
        reason: "invalid float literal".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("GA_MENSUALPARCIAL"));
    assert!(message.contains("row 7"));
    assert!(message.contains("Users"));
    assert!(message.contains("abc"));

    let error = ForecastError::MissingColumn {
        table: TableKind::Monthly,
        row: 0,
        column: "FechaFiltro".to_string(),
    };
    assert!(error.to_string().contains("FechaFiltro"));
}

#[test]
fn test_lookup_error_display() {
    let error = LookupError::LookupFailure {
        table: TableKind::Monthly,
        date: date(2023, 3, 31),
        found: 2,
    };
    assert_eq!(
        error.to_string(),
        "expected exactly one GA_MENSUAL row on 2023-03-31, found 2"
    );

    let error = LookupError::MissingMetric {
        table: TableKind::PartialMonth,
        date: date(2023, 3, 15),
        metric: Metric::Sessions,
    };
    assert!(error.to_string().contains("Sessions"));
}

#[test]
fn test_missing_history_keeps_its_cause() {
    let cause = LookupError::LookupFailure {
        table: TableKind::PartialMonth,
        date: date(2023, 3, 15),
        found: 0,
    };
    let error = LookupError::MissingHistory {
        day: date(2024, 3, 15),
        one_year: date(2023, 3, 15),
        two_years: date(2022, 3, 15),
        two_years_available: true,
        source: Box::new(cause.clone()),
    };

    let message = error.to_string();
    assert!(message.contains("2024-03-15"));
    assert!(message.contains("two years back (2022-03-15) available"));

    let source = error.source().expect("MissingHistory has a source");
    assert_eq!(source.to_string(), cause.to_string());
}
