//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request produces:
//!     → logging.rs (structured log events: stdout, combined.log, error.log)
//!     → metrics.rs (counters, histograms, collect-time gauges)
//!     → tracing.rs (spans bridged to the OTLP exporter)
//!
//! Consumers:
//!     → Log aggregation (stdout, file)
//!     → Metrics endpoint (Prometheus scrape of /metrics)
//!     → Distributed tracing backend (OTLP collector, Jaeger)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every log event via the request span
//! - The metrics registry is built explicitly and injected into the router
//! - Span export is optional and disabled entirely in test mode

use std::path::PathBuf;

use thiserror::Error;

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::metrics::{
    ErrorLabels, MetricsError, MetricsRegistry, RequestLabels, EXPOSITION_CONTENT_TYPE,
    UPKEEP_INTERVAL,
};
pub use self::tracing::{extract_parent_context, Telemetry};

/// Errors raised while installing logging and span export.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("cannot open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialize tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}
