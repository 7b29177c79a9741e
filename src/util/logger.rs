use std::path::Path;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "portfolio-backend";

/// Console plus daily rolling file logging. Keep the value alive for the
/// lifetime of the process; dropping it flushes and stops the file writers.
pub struct Logger {
    pub guards: Vec<WorkerGuard>,
}

impl Logger {
    pub fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        let guards = Self::setup_logging(Path::new(&log_dir))?;
        Ok(Logger { guards })
    }

    /// Writes plain and JSON files, each split into a general and an
    /// error-only stream:
    ///
    /// ```text
    /// <dir>/portfolio-backend.log
    /// <dir>/error/portfolio-backend-error.log
    /// <dir>/json/portfolio-backend.json
    /// <dir>/error/json/portfolio-backend-error.json
    /// ```
    pub fn setup_logging(dir: &Path) -> Result<Vec<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
        let error_dir = dir.join("error");
        let json_dir = dir.join("json");
        let error_json_dir = error_dir.join("json");
        for d in [dir, error_dir.as_path(), json_dir.as_path(), error_json_dir.as_path()] {
            std::fs::create_dir_all(d)?;
        }

        let console_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,portfolio_backend=debug"));
        let file_log_level = std::env::var("FILE_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
        let error_file_log_level = std::env::var("ERROR_FILE_LOG_LEVEL").unwrap_or_else(|_| "error".to_string());

        let (general, general_guard) =
            non_blocking(rolling::daily(dir, format!("{}.log", LOG_FILE_PREFIX)));
        let (errors, error_guard) =
            non_blocking(rolling::daily(&error_dir, format!("{}-error.log", LOG_FILE_PREFIX)));
        let (general_json, json_guard) =
            non_blocking(rolling::daily(&json_dir, format!("{}.json", LOG_FILE_PREFIX)));
        let (errors_json, error_json_guard) =
            non_blocking(rolling::daily(&error_json_dir, format!("{}-error.json", LOG_FILE_PREFIX)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(true)
                    .with_filter(console_filter),
            )
            .with(
                fmt::layer()
                    .with_writer(general)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&file_log_level)),
            )
            .with(
                fmt::layer()
                    .with_writer(errors)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&error_file_log_level)),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(general_json)
                    .with_target(true)
                    .with_current_span(true)
                    .with_filter(EnvFilter::new(&file_log_level)),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(errors_json)
                    .with_target(true)
                    .with_current_span(true)
                    .with_filter(EnvFilter::new(&error_file_log_level)),
            )
            .try_init()?;

        Ok(vec![general_guard, error_guard, json_guard, error_json_guard])
    }
}
