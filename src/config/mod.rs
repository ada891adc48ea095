//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → schema.rs (environment overrides: DEPLOYMENT_NAME, APP_ENV)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to telemetry, metrics and the HTTP server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    AppConfig, DemoConfig, ListenerConfig, LogFormat, LoggingConfig, MetricsConfig,
    TelemetryConfig,
};
pub use validation::{validate_config, ValidationError};
