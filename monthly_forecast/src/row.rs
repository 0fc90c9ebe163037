//! Typed rows and the column conversions that produce them

use crate::error::{ForecastError, Result};
use crate::table::TableKind;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Column holding the row date
pub const FECHA_FILTRO: &str = "FechaFiltro";
/// Column holding the creation timestamp
pub const FECHA_CREACION: &str = "FechaCreacion";

/// A raw row as handed over by the fetch layer: column name to field text
pub type RawRow = BTreeMap<String, String>;

/// Numeric metrics carried by every table
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Metric {
    #[default]
    #[serde(alias = "users")]
    Users,
    #[serde(alias = "sessions")]
    Sessions,
    #[serde(alias = "pageviews")]
    Pageviews,
}

impl Metric {
    /// All metrics, in column order
    pub const ALL: [Metric; 3] = [Metric::Users, Metric::Sessions, Metric::Pageviews];

    /// Source column name
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Users => "Users",
            Metric::Sessions => "Sessions",
            Metric::Pageviews => "Pageviews",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.column().eq_ignore_ascii_case(s))
            .ok_or_else(|| ForecastError::InvalidParameter(format!("Unknown metric: {}", s)))
    }
}

/// One record of a time-series table.
///
/// Rows are immutable once built; tables only hand out shared references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    fecha_filtro: NaiveDate,
    users: f64,
    sessions: Option<f64>,
    pageviews: Option<f64>,
    fecha_creacion: Option<NaiveDateTime>,
    extra: BTreeMap<String, String>,
}

impl Row {
    /// Create a row with the required fields only
    pub fn new(fecha_filtro: NaiveDate, users: f64) -> Self {
        Self {
            fecha_filtro,
            users,
            sessions: None,
            pageviews: None,
            fecha_creacion: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set a metric value
    pub fn with_metric(mut self, metric: Metric, value: f64) -> Self {
        match metric {
            Metric::Users => self.users = value,
            Metric::Sessions => self.sessions = Some(value),
            Metric::Pageviews => self.pageviews = Some(value),
        }
        self
    }

    /// Set the creation timestamp
    pub fn with_created_at(mut self, created_at: NaiveDateTime) -> Self {
        self.fecha_creacion = Some(created_at);
        self
    }

    /// Date the row is keyed by
    pub fn fecha_filtro(&self) -> NaiveDate {
        self.fecha_filtro
    }

    /// Value of `metric`, if the row carries it
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Users => Some(self.users),
            Metric::Sessions => self.sessions,
            Metric::Pageviews => self.pageviews,
        }
    }

    /// Creation timestamp from the source, if any
    pub fn fecha_creacion(&self) -> Option<NaiveDateTime> {
        self.fecha_creacion
    }

    /// Raw text of a column that has no typed field
    pub fn extra(&self, column: &str) -> Option<&str> {
        self.extra.get(column).map(String::as_str)
    }
}

/// Declared type of a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Finite 64-bit float
    Float,
    /// ISO-8601 calendar date
    Date,
    /// Date and time, space or `T` separated, optional fractional seconds
    Timestamp,
    /// Kept as text
    Text,
}

/// A converted field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Text(String),
    /// Empty field in a typed column
    Null,
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl ColumnType {
    /// Convert a raw field, returning the reason on failure
    pub fn convert(&self, raw: &str) -> std::result::Result<Value, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() && *self != ColumnType::Text {
            return Ok(Value::Null);
        }

        match self {
            ColumnType::Float => {
                let value: f64 = trimmed.parse().map_err(|e| format!("not a number: {}", e))?;
                if value.is_finite() {
                    Ok(Value::Float(value))
                } else {
                    Err("not a finite number".to_string())
                }
            }
            ColumnType::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| format!("not an ISO date: {}", e)),
            ColumnType::Timestamp => TIMESTAMP_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .map(Value::Timestamp)
                .ok_or_else(|| "not a timestamp".to_string()),
            ColumnType::Text => Ok(Value::Text(raw.to_string())),
        }
    }
}

/// Per-column conversion table applied when a table is built
#[derive(Debug, Clone, Default)]
pub struct ColumnConverters {
    columns: BTreeMap<String, ColumnType>,
}

impl ColumnConverters {
    /// An empty conversion table; every column is kept as text
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversions for the analytics tables: metrics as floats,
    /// `FechaFiltro` as a date and `FechaCreacion` as a timestamp
    pub fn standard() -> Self {
        Metric::ALL
            .iter()
            .fold(Self::new(), |converters, metric| {
                converters.with(metric.column(), ColumnType::Float)
            })
            .with(FECHA_FILTRO, ColumnType::Date)
            .with(FECHA_CREACION, ColumnType::Timestamp)
    }

    /// Register the type of a column
    pub fn with(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.insert(column.into(), column_type);
        self
    }

    /// Declared type of `column`, if any
    pub fn get(&self, column: &str) -> Option<ColumnType> {
        self.columns.get(column).copied()
    }

    /// Convert every field of `raw` and assemble a typed row.
    ///
    /// `index` is the position of the row in its source and only appears in
    /// error messages.
    pub fn convert_row(&self, table: TableKind, index: usize, raw: &RawRow) -> Result<Row> {
        let mut values = BTreeMap::new();
        for (column, field) in raw {
            let column_type = self.get(column).unwrap_or(ColumnType::Text);
            let value = column_type
                .convert(field)
                .map_err(|reason| ForecastError::Conversion {
                    table,
                    row: index,
                    column: column.clone(),
                    value: field.clone(),
                    reason,
                })?;
            values.insert(column.as_str(), value);
        }

        let fail = |column: &str, reason: &str| ForecastError::Conversion {
            table,
            row: index,
            column: column.to_string(),
            value: raw.get(column).cloned().unwrap_or_default(),
            reason: reason.to_string(),
        };

        let fecha_filtro = match values.remove(FECHA_FILTRO) {
            Some(Value::Date(date)) => date,
            Some(Value::Null) => return Err(fail(FECHA_FILTRO, "empty value")),
            Some(_) => return Err(fail(FECHA_FILTRO, "expected a date")),
            None => {
                return Err(ForecastError::MissingColumn {
                    table,
                    row: index,
                    column: FECHA_FILTRO.to_string(),
                })
            }
        };

        let users = match values.remove(Metric::Users.column()) {
            Some(Value::Float(value)) => value,
            Some(Value::Null) => return Err(fail(Metric::Users.column(), "empty value")),
            Some(_) => return Err(fail(Metric::Users.column(), "expected a number")),
            None => {
                return Err(ForecastError::MissingColumn {
                    table,
                    row: index,
                    column: Metric::Users.column().to_string(),
                })
            }
        };

        let mut row = Row::new(fecha_filtro, users);
        for metric in [Metric::Sessions, Metric::Pageviews] {
            match values.remove(metric.column()) {
                Some(Value::Float(value)) => row = row.with_metric(metric, value),
                Some(Value::Null) | None => {}
                Some(_) => return Err(fail(metric.column(), "expected a number")),
            }
        }

        match values.remove(FECHA_CREACION) {
            Some(Value::Timestamp(created_at)) => row = row.with_created_at(created_at),
            Some(Value::Null) | None => {}
            Some(_) => return Err(fail(FECHA_CREACION, "expected a timestamp")),
        }

        for column in values.into_keys() {
            if let Some(field) = raw.get(column) {
                row.extra.insert(column.to_string(), field.clone());
            }
        }

        Ok(row)
    }
}
