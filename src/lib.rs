//! Instrumented demo HTTP service.
//!
//! A handful of static endpoints wrapped in request logging, Prometheus
//! metrics and OpenTelemetry span export.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use error::AppError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::{MetricsRegistry, Telemetry};
