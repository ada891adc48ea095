//! Structured logging.
//!
//! # Responsibilities
//! - Build the `tracing` subscriber stack
//! - Route events to stdout and, optionally, to `combined.log` / `error.log`
//! - Configure the log filter from config or `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log files are always JSON and never carry ANSI escapes
//! - Extra layers (span export) are passed in by the caller

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};
use crate::observability::TelemetryError;

/// File receiving every event when `logging.log_dir` is set.
pub const COMBINED_LOG: &str = "combined.log";

/// File receiving only ERROR events when `logging.log_dir` is set.
pub const ERROR_LOG: &str = "error.log";

/// Subscriber the output layers are stacked on.
pub type FilteredRegistry = Layered<EnvFilter, Registry>;

/// Type-erased output layer.
pub type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync + 'static>;

/// Resolve the filter: `RUST_LOG` wins, then the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.level)?),
    }
}

/// Build the stdout layer in the configured format.
pub fn stdout_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer().json().boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    }
}

/// Build the `combined.log` and `error.log` layers under `dir`.
pub fn file_layers(dir: &Path) -> Result<Vec<BoxedLayer>, TelemetryError> {
    fs::create_dir_all(dir).map_err(|source| TelemetryError::LogFile {
        path: dir.to_path_buf(),
        source,
    })?;

    let combined = open_append(dir.join(COMBINED_LOG))?;
    let errors = open_append(dir.join(ERROR_LOG))?;

    Ok(vec![
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(Mutex::new(combined))
            .boxed(),
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(Mutex::new(errors))
            .with_filter(LevelFilter::ERROR)
            .boxed(),
    ])
}

fn open_append(path: PathBuf) -> Result<File, TelemetryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| TelemetryError::LogFile { path, source })
}

/// Install the global subscriber with the configured outputs plus `extra`.
pub fn init_subscriber(
    config: &LoggingConfig,
    extra: Option<BoxedLayer>,
) -> Result<(), TelemetryError> {
    let mut layers = vec![stdout_layer(config.format)];
    if let Some(dir) = &config.log_dir {
        layers.extend(file_layers(Path::new(dir))?);
    }
    layers.extend(extra);

    tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(layers)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::subscriber::with_default;

    #[test]
    fn falls_back_to_configured_level() {
        let config = LoggingConfig {
            level: "warn,pulse_demo=debug".into(),
            ..LoggingConfig::default()
        };
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    fn file_layers_split_errors_from_combined() {
        let dir = tempfile::tempdir().unwrap();
        let layers = file_layers(dir.path()).unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("info"))
            .with(layers);

        with_default(subscriber, || {
            tracing::info!(route = "/health", "Request processed");
            tracing::error!(error = "boom", "Error occurred");
        });

        let combined = fs::read_to_string(dir.path().join(COMBINED_LOG)).unwrap();
        let errors = fs::read_to_string(dir.path().join(ERROR_LOG)).unwrap();

        assert_eq!(combined.lines().count(), 2);
        assert!(combined.contains("Request processed"));
        assert_eq!(errors.lines().count(), 1);
        assert!(errors.contains("Error occurred"));
        assert!(!errors.contains("Request processed"));
    }

    #[test]
    fn unwritable_log_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        let err = file_layers(&blocker.join("logs")).err().unwrap();
        assert!(matches!(err, TelemetryError::LogFile { .. }));
    }
}
