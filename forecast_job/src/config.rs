//! Configuration management for the forecast job.
//!
//! Sources are layered, later ones overriding earlier ones:
//! 1. Defaults embedded in the binary (`config/default.toml`)
//! 2. The file given with `--config`
//! 3. Environment variables prefixed with `MONTHLY_FORECAST_`, nested keys
//!    separated by `__` (`MONTHLY_FORECAST_OUTPUT__PATH=out.csv`)
//! 4. Command-line arguments

use crate::cli::Args;
use crate::Result;
use chrono::NaiveDate;
use monthly_forecast::{Metric, Strategy, TablePaths};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Job configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Input tables
    pub sources: SourceConfig,
    /// Where records go
    pub output: OutputConfig,
    /// What to forecast
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Log file settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// CSV files holding the three tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub daily: PathBuf,
    pub partial_month: PathBuf,
    pub monthly: PathBuf,
    /// Keep only rows whose `Origen` column has this value
    #[serde(default)]
    pub origin: Option<String>,
}

impl SourceConfig {
    pub fn tables(&self) -> TablePaths {
        TablePaths {
            daily: self.daily.clone(),
            partial_month: self.partial_month.clone(),
            monthly: self.monthly.clone(),
        }
    }
}

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One flat row per day
    #[default]
    Csv,
    /// One JSON record per line
    Jsonl,
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    /// Optional JSON file receiving the run summary
    #[serde(default)]
    pub summary: Option<PathBuf>,
}

/// Forecast settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default)]
    pub metric: Metric,
    #[serde(default = "Strategy::defaults")]
    pub strategies: Vec<Strategy>,
    /// First day to forecast
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Day after the last one to forecast; today when unset
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            metric: Metric::default(),
            strategies: Strategy::defaults(),
            start_date: None,
            end_date: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory receiving one log file per run
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            level: default_log_level(),
        }
    }
}

impl JobConfig {
    /// Load configuration from all sources
    pub fn load(args: &Args) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            DEFAULT_CONFIG,
            config::FileFormat::Toml,
        ));

        // Load user config if specified
        if let Some(path) = &args.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MONTHLY_FORECAST")
                .prefix_separator("_")
                .separator("__"),
        );

        let mut config: JobConfig = builder.build()?.try_deserialize()?;
        config.apply_args(args);
        Ok(config)
    }

    /// Override settings with command line arguments
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(start) = args.start_date {
            self.forecast.start_date = Some(start);
        }
        if args.debug {
            self.logging.level = "debug".to_string();
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("log")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_embedded_defaults() {
        let config = JobConfig::load(&Args::default()).unwrap();

        assert_eq!(config.sources.origin.as_deref(), Some("RED CienRadios"));
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert_eq!(config.forecast.metric, Metric::Users);
        assert_eq!(config.forecast.strategies, Strategy::defaults());
        assert_eq!(config.forecast.start_date, None);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = config_file(
            r#"
[sources]
daily = "d.csv"
partial_month = "p.csv"
monthly = "m.csv"

[output]
path = "out.jsonl"
format = "jsonl"

[forecast]
metric = "Sessions"
start_date = "2024-03-01"
strategies = [
    { kind = "past_month" },
    { kind = "ratio_weighted_average", weight = 0.75 },
]
"#,
        );
        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..Args::default()
        };

        let config = JobConfig::load(&args).unwrap();

        assert_eq!(config.sources.tables().daily, PathBuf::from("d.csv"));
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        assert_eq!(config.forecast.metric, Metric::Sessions);
        assert_eq!(
            config.forecast.strategies,
            vec![
                Strategy::PastMonth,
                Strategy::RatioWeightedAverage { weight: 0.75 }
            ]
        );
        assert_eq!(config.forecast.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        // Not in the file, so the embedded default stays
        assert_eq!(config.logging.dir, PathBuf::from("log"));
    }

    #[test]
    fn test_args_override_file() {
        let file = config_file("[forecast]\nstart_date = \"2024-03-01\"\n");
        let args = Args {
            config: Some(file.path().to_path_buf()),
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            debug: true,
            ..Args::default()
        };

        let config = JobConfig::load(&args).unwrap();

        assert_eq!(config.forecast.start_date, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/monthly_forecast.toml")),
            ..Args::default()
        };
        assert!(JobConfig::load(&args).is_err());
    }
}
