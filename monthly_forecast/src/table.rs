//! Time-indexed tables and the named set predictors query
//!
//! A [`TimeSeriesTable`] is a date-sorted list of [`Row`]s. At most one row
//! per `FechaFiltro` is expected, but this is only checked on request with
//! [`TimeSeriesTable::check_consistency`]: predictors assume it and treat
//! any other match count as a lookup failure.

use crate::error::{ForecastError, Result};
use crate::row::{ColumnConverters, RawRow, Row};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// The three tables a run works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// One row per calendar day
    Daily,
    /// One row per day holding the month-to-date total
    PartialMonth,
    /// One row per month, keyed by its last day, holding the final total
    Monthly,
}

impl TableKind {
    /// All table kinds
    pub const ALL: [TableKind; 3] = [TableKind::Daily, TableKind::PartialMonth, TableKind::Monthly];

    /// Name of the source table
    pub fn source_name(&self) -> &'static str {
        match self {
            TableKind::Daily => "GA_DIARIO",
            TableKind::PartialMonth => "GA_MENSUALPARCIAL",
            TableKind::Monthly => "GA_MENSUAL",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

/// Ordered collection of typed rows
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    kind: TableKind,
    rows: Vec<Row>,
}

impl TimeSeriesTable {
    /// Build a table from typed rows, sorted by `FechaFiltro`
    pub fn new(kind: TableKind, mut rows: Vec<Row>) -> Self {
        rows.sort_by_key(Row::fecha_filtro);
        Self { kind, rows }
    }

    /// Convert raw rows column by column, then sort them by `sort_key`.
    ///
    /// The sort is stable, so rows with equal keys keep their source order.
    /// The first field that fails to convert aborts construction.
    pub fn from_rows<I, F, K>(
        kind: TableKind,
        raw_rows: I,
        converters: &ColumnConverters,
        sort_key: F,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = RawRow>,
        F: FnMut(&Row) -> K,
        K: Ord,
    {
        let mut rows = raw_rows
            .into_iter()
            .enumerate()
            .map(|(index, raw)| converters.convert_row(kind, index, &raw))
            .collect::<Result<Vec<_>>>()?;
        rows.sort_by_key(sort_key);

        Ok(Self { kind, rows })
    }

    /// [`TimeSeriesTable::from_rows`] sorted by `FechaFiltro`
    pub fn from_raw<I>(kind: TableKind, raw_rows: I, converters: &ColumnConverters) -> Result<Self>
    where
        I: IntoIterator<Item = RawRow>,
    {
        Self::from_rows(kind, raw_rows, converters, Row::fecha_filtro)
    }

    /// A new table with `row` added at its date position
    pub fn with_row(mut self, row: Row) -> Self {
        let at = self
            .rows
            .partition_point(|existing| existing.fecha_filtro() <= row.fecha_filtro());
        self.rows.insert(at, row);
        self
    }

    /// Which table this is
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Source table name
    pub fn name(&self) -> &'static str {
        self.kind.source_name()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in table order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Iterate rows in table order
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// All rows matching `predicate`, in table order
    pub fn rows_where<P>(&self, predicate: P) -> Vec<&Row>
    where
        P: Fn(&Row) -> bool,
    {
        self.rows.iter().filter(|row| predicate(*row)).collect()
    }

    /// All rows dated `date`
    pub fn rows_on(&self, date: NaiveDate) -> Vec<&Row> {
        self.rows_where(|row| row.fecha_filtro() == date)
    }

    /// True when no two rows share a `FechaFiltro`
    pub fn check_consistency(&self) -> bool {
        let distinct: HashSet<NaiveDate> = self.rows.iter().map(Row::fecha_filtro).collect();
        distinct.len() == self.rows.len()
    }

    /// Dates that appear on more than one row, ascending
    pub fn duplicate_dates(&self) -> Vec<NaiveDate> {
        let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.fecha_filtro()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(date, _)| date)
            .collect()
    }

    /// Earliest and latest `FechaFiltro`
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.iter().map(Row::fecha_filtro).min()?;
        let last = self.rows.iter().map(Row::fecha_filtro).max()?;
        Some((first, last))
    }
}

impl<'a> IntoIterator for &'a TimeSeriesTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// The named tables of one run
#[derive(Debug, Clone, PartialEq)]
pub struct TableSet {
    daily: TimeSeriesTable,
    partial_month: TimeSeriesTable,
    monthly: TimeSeriesTable,
}

impl TableSet {
    /// Group the three tables, checking each one sits in its own slot
    pub fn new(
        daily: TimeSeriesTable,
        partial_month: TimeSeriesTable,
        monthly: TimeSeriesTable,
    ) -> Result<Self> {
        for (expected, table) in [
            (TableKind::Daily, &daily),
            (TableKind::PartialMonth, &partial_month),
            (TableKind::Monthly, &monthly),
        ] {
            if table.kind() != expected {
                return Err(ForecastError::InvalidParameter(format!(
                    "Expected a {} table, got {}",
                    expected,
                    table.kind()
                )));
            }
        }

        Ok(Self {
            daily,
            partial_month,
            monthly,
        })
    }

    /// The table of the given kind
    pub fn table(&self, kind: TableKind) -> &TimeSeriesTable {
        match kind {
            TableKind::Daily => &self.daily,
            TableKind::PartialMonth => &self.partial_month,
            TableKind::Monthly => &self.monthly,
        }
    }

    /// Consistency of each table
    pub fn consistency_report(&self) -> Vec<(TableKind, bool)> {
        TableKind::ALL
            .iter()
            .map(|&kind| (kind, self.table(kind).check_consistency()))
            .collect()
    }

    /// True when every table is consistent
    pub fn check_consistency(&self) -> bool {
        self.consistency_report()
            .into_iter()
            .all(|(_, consistent)| consistent)
    }
}
