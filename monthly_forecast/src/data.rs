//! Loading raw rows and building the run's tables

use crate::error::{ForecastError, Result};
use crate::row::{ColumnConverters, RawRow};
use crate::table::{TableKind, TableSet, TimeSeriesTable};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Column identifying the property a row belongs to
pub const ORIGIN_COLUMN: &str = "Origen";

/// Where each table's rows come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePaths {
    pub daily: PathBuf,
    pub partial_month: PathBuf,
    pub monthly: PathBuf,
}

impl TablePaths {
    /// Path of the table of the given kind
    pub fn path(&self, kind: TableKind) -> &Path {
        match kind {
            TableKind::Daily => &self.daily,
            TableKind::PartialMonth => &self.partial_month,
            TableKind::Monthly => &self.monthly,
        }
    }
}

/// Data loader for the analytics tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Read raw rows from a CSV file with a header line.
    ///
    /// With `origin` set, only rows whose `Origen` column equals it are kept.
    pub fn from_csv<P: AsRef<Path>>(path: P, origin: Option<&str>) -> Result<Vec<RawRow>> {
        let file = File::open(path.as_ref()).map_err(|e| {
            ForecastError::DataError(format!("Cannot open {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_reader(file, origin)
    }

    /// Read raw rows from any CSV source with a header line
    pub fn from_reader<R: Read>(reader: R, origin: Option<&str>) -> Result<Vec<RawRow>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        if origin.is_some() && !headers.iter().any(|header| header == ORIGIN_COLUMN) {
            return Err(ForecastError::DataError(format!(
                "Filtering by origin requires a '{}' column",
                ORIGIN_COLUMN
            )));
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let row: RawRow = headers
                .iter()
                .zip(record.iter())
                .map(|(header, field)| (header.to_string(), field.to_string()))
                .collect();

            let keep = match origin {
                Some(origin) => row.get(ORIGIN_COLUMN).map(String::as_str) == Some(origin),
                None => true,
            };
            if keep {
                rows.push(row);
            }
        }

        Ok(rows)
    }

    /// Load, convert and sort one table, logging its size and consistency
    pub fn load_table<P: AsRef<Path>>(
        kind: TableKind,
        path: P,
        origin: Option<&str>,
        converters: &ColumnConverters,
    ) -> Result<TimeSeriesTable> {
        let started = Instant::now();
        info!(table = %kind, path = %path.as_ref().display(), "retrieving table");

        let raw_rows = Self::from_csv(path, origin)?;
        let raw_count = raw_rows.len();
        let table = TimeSeriesTable::from_raw(kind, raw_rows, converters)?;

        info!(
            table = %kind,
            source_rows = raw_count,
            rows = table.len(),
            elapsed = ?started.elapsed(),
            "got table"
        );
        if table.check_consistency() {
            info!(table = %kind, "table is consistent");
        } else {
            warn!(table = %kind, duplicates = ?table.duplicate_dates(), "table IS NOT consistent");
        }

        Ok(table)
    }

    /// Load all three tables
    pub fn load_tables(
        paths: &TablePaths,
        origin: Option<&str>,
        converters: &ColumnConverters,
    ) -> Result<TableSet> {
        TableSet::new(
            Self::load_table(TableKind::Daily, paths.path(TableKind::Daily), origin, converters)?,
            Self::load_table(
                TableKind::PartialMonth,
                paths.path(TableKind::PartialMonth),
                origin,
                converters,
            )?,
            Self::load_table(TableKind::Monthly, paths.path(TableKind::Monthly), origin, converters)?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Users,Sessions,Pageviews,FechaFiltro,FechaCreacion,Origen
300,400,900,2023-03-15,2023-03-16 04:00:00,RED CienRadios
120,150,300,2023-03-15,2023-03-16 04:00:00,Other
";

    #[test]
    fn test_from_reader_reads_all_rows() {
        let rows = DataLoader::from_reader(CSV.as_bytes(), None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Users").map(String::as_str), Some("300"));
    }

    #[test]
    fn test_from_reader_filters_origin() {
        let rows = DataLoader::from_reader(CSV.as_bytes(), Some("RED CienRadios")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Origen").map(String::as_str), Some("RED CienRadios"));
    }

    #[test]
    fn test_origin_filter_requires_column() {
        let csv = "Users,FechaFiltro\n1,2023-03-01\n";
        let result = DataLoader::from_reader(csv.as_bytes(), Some("RED CienRadios"));
        assert!(matches!(result, Err(ForecastError::DataError(_))));
    }

    #[test]
    fn test_ragged_rows_are_csv_errors() {
        let csv = "Users,FechaFiltro\n1,2023-03-01,extra\n";
        let result = DataLoader::from_reader(csv.as_bytes(), None);
        assert!(matches!(result, Err(ForecastError::CsvError(_))));
    }
}
