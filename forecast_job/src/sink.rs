//! File sinks for forecast records
//!
//! [`CsvSink`] writes the flat table the forecasts were historically stored
//! in: `UKEY`, `FechaFiltro`, `MonthlyActual`, one `Forecast_<label>` column
//! per strategy, `Forecast_w_2y_optimal`, `Weight` and `FechaCreacion`.
//! Missing values are empty fields. [`JsonLinesSink`] writes the full
//! record as one JSON object per line.

use crate::config::{OutputConfig, OutputFormat};
use crate::{JobError, Result};
use monthly_forecast::ForecastRecord;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub use monthly_forecast::{ForecastSink, MemorySink};

/// Column holding the placeholder optimal-weight forecast
pub const OPTIMAL_COLUMN: &str = "Forecast_w_2y_optimal";

/// Timestamp layout of `FechaCreacion`, millisecond precision
const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Header of the CSV output for the given strategy labels
pub fn csv_header(labels: &[&str]) -> Vec<String> {
    let mut header = vec![
        "UKEY".to_string(),
        "FechaFiltro".to_string(),
        "MonthlyActual".to_string(),
    ];
    header.extend(labels.iter().map(|label| format!("Forecast_{}", label)));
    header.extend(
        [OPTIMAL_COLUMN, "Weight", "FechaCreacion"]
            .iter()
            .map(|column| column.to_string()),
    );
    header
}

fn field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes one flat CSV row per record
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    labels: Vec<String>,
}

impl CsvSink<File> {
    /// Create (or truncate) `path` and write the header
    pub fn create<P: AsRef<Path>>(path: P, labels: &[&str]) -> Result<Self> {
        create_parent(path.as_ref())?;
        Self::from_writer(File::create(path)?, labels)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wrap `writer` and write the header
    pub fn from_writer(writer: W, labels: &[&str]) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(csv_header(labels))?;
        Ok(Self {
            writer,
            labels: labels.iter().map(|label| label.to_string()).collect(),
        })
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| JobError::Io(e.into_error()))
    }

    fn row(&self, record: &ForecastRecord) -> Vec<String> {
        let mut row = vec![
            record.ukey.clone(),
            record.fecha_filtro.to_string(),
            field(record.monthly_actual),
        ];
        row.extend(
            self.labels
                .iter()
                .map(|label| field(record.forecast(label).and_then(|entry| entry.forecast))),
        );
        row.push(record.optimal.forecast().to_string());
        row.push(record.optimal.weight().to_string());
        row.push(record.created_at.format(CREATED_AT_FORMAT).to_string());
        row
    }
}

impl<W: Write> ForecastSink for CsvSink<W> {
    fn write(&mut self, record: &ForecastRecord) -> monthly_forecast::error::Result<()> {
        let row = self.row(record);
        self.writer.write_record(&row)?;
        Ok(())
    }

    fn flush(&mut self) -> monthly_forecast::error::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes each record as a JSON object on its own line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (or truncate) `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        create_parent(path.as_ref())?;
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ForecastSink for JsonLinesSink<W> {
    fn write(&mut self, record: &ForecastRecord) -> monthly_forecast::error::Result<()> {
        serde_json::to_writer(&mut self.writer, record).map_err(io::Error::from)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> monthly_forecast::error::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Prints every record to stdout before passing it on
pub struct EchoSink<S> {
    inner: S,
}

impl<S: ForecastSink> EchoSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: ForecastSink> ForecastSink for EchoSink<S> {
    fn write(&mut self, record: &ForecastRecord) -> monthly_forecast::error::Result<()> {
        println!("{}", record_line(record));
        self.inner.write(record)
    }

    fn flush(&mut self) -> monthly_forecast::error::Result<()> {
        self.inner.flush()
    }
}

/// One-line tuple rendering of a record, `None` for missing forecasts
pub fn record_line(record: &ForecastRecord) -> String {
    let forecasts = record
        .forecasts
        .iter()
        .map(|entry| match entry.forecast {
            Some(value) => value.to_string(),
            None => "None".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "('{}', {}, {}, {}, '{}', '{}')",
        record.ukey,
        forecasts,
        record.optimal.forecast(),
        record.optimal.weight(),
        record.fecha_filtro,
        record.created_at.format(CREATED_AT_FORMAT)
    )
}

/// Open the sink described by `output`
pub fn open_sink(output: &OutputConfig, labels: &[&str]) -> Result<Box<dyn ForecastSink>> {
    let sink: Box<dyn ForecastSink> = match output.format {
        OutputFormat::Csv => Box::new(CsvSink::create(&output.path, labels)?),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::create(&output.path)?),
    };
    Ok(sink)
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)?,
        _ => {}
    }
    Ok(())
}
