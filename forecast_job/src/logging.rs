//! Log file setup
//!
//! Every run logs to its own file, `<dir>/<YYYYmmddTHHMMSS>.log`, through a
//! non-blocking writer. Keep the returned guard alive until the run ends or
//! buffered lines are lost.

use crate::config::LoggingConfig;
use crate::{JobError, Result};
use chrono::{Local, NaiveDateTime};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// File name stem of the log started at `started`
pub fn log_file_stem(started: NaiveDateTime) -> String {
    started.format("%Y%m%dT%H%M%S").to_string()
}

/// Install the global subscriber writing to a fresh log file
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(log_file_stem(Local::now().naive_local()))
        .filename_suffix("log")
        .build(&config.dir)
        .map_err(|e| JobError::Logging(e.to_string()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_timer(ChronoLocal::new("%H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .try_init()
        .map_err(|e| JobError::Logging(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_log_file_stem() {
        let started = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(4, 7, 9)
            .unwrap();
        assert_eq!(log_file_stem(started), "20240305T040709");
    }
}
