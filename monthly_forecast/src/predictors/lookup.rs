//! Historic lookups shared by every predictor
//!
//! Each lookup requires exactly one matching row. Zero matches means a data
//! gap; more than one means the table failed its consistency check. Both
//! are reported as [`LookupError::LookupFailure`] with the match count and
//! never resolved by picking one of several rows.

use crate::error::LookupError;
use crate::row::{Metric, Row};
use crate::table::{TableKind, TableSet};
use chrono::NaiveDate;
use month_math::month_end_of;

/// The single row of `kind` dated `date`
pub fn exactly_one(
    tables: &TableSet,
    kind: TableKind,
    date: NaiveDate,
) -> Result<&Row, LookupError> {
    match tables.table(kind).rows_on(date).as_slice() {
        [row] => Ok(*row),
        matches => Err(LookupError::LookupFailure {
            table: kind,
            date,
            found: matches.len(),
        }),
    }
}

/// Partial-month row for `day`
pub fn historic_partial(tables: &TableSet, day: NaiveDate) -> Result<&Row, LookupError> {
    exactly_one(tables, TableKind::PartialMonth, day)
}

/// Monthly row for the month containing `day`
pub fn historic_monthly(tables: &TableSet, day: NaiveDate) -> Result<&Row, LookupError> {
    exactly_one(tables, TableKind::Monthly, month_end_of(day)?)
}

/// Value of `metric` in a row looked up from `table`
pub fn metric_value(row: &Row, table: TableKind, metric: Metric) -> Result<f64, LookupError> {
    row.metric(metric).ok_or(LookupError::MissingMetric {
        table,
        date: row.fecha_filtro(),
        metric,
    })
}

/// Month-to-date value of `metric` on `day`
pub fn partial_value(tables: &TableSet, metric: Metric, day: NaiveDate) -> Result<f64, LookupError> {
    metric_value(historic_partial(tables, day)?, TableKind::PartialMonth, metric)
}

/// Final total of `metric` for the month containing `day`
pub fn monthly_value(tables: &TableSet, metric: Metric, day: NaiveDate) -> Result<f64, LookupError> {
    metric_value(historic_monthly(tables, day)?, TableKind::Monthly, metric)
}

/// Share of the month's final total already accumulated by `day`
pub fn partial_monthly_ratio(
    tables: &TableSet,
    metric: Metric,
    day: NaiveDate,
) -> Result<f64, LookupError> {
    let partial = partial_value(tables, metric, day)?;
    let monthly = monthly_value(tables, metric, day)?;

    let ratio = partial / monthly;
    if monthly == 0.0 || !ratio.is_finite() {
        return Err(LookupError::DegenerateRatio {
            date: day,
            partial,
            monthly,
        });
    }

    Ok(ratio)
}
