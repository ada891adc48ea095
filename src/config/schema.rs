//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files, and
//! every section falls back to its defaults so an empty file is valid.

use serde::{Deserialize, Serialize};

/// Environment variable that selects the service name used in logs and traces.
pub const DEPLOYMENT_NAME_ENV: &str = "DEPLOYMENT_NAME";

/// Environment variable that forces test mode when set to `test`.
pub const APP_ENV: &str = "APP_ENV";

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Metric naming and histogram layout.
    pub metrics: MetricsConfig,

    /// Span export settings.
    pub telemetry: TelemetryConfig,

    /// Behaviour of the demo routes.
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Apply overrides taken from the process environment.
    ///
    /// `DEPLOYMENT_NAME` replaces the service name and `APP_ENV=test`
    /// disables span export.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(DEPLOYMENT_NAME_ENV).ok(),
            std::env::var(APP_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, deployment: Option<String>, app_env: Option<String>) {
        if let Some(name) = deployment.filter(|n| !n.trim().is_empty()) {
            self.telemetry.service_name = name;
        }
        if app_env.as_deref() == Some("test") {
            self.telemetry.enabled = false;
        }
    }

    /// Configuration suited to in-process tests: no span export, no log
    /// files and no artificial delay.
    pub fn for_tests() -> Self {
        let mut config = Self::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        config.telemetry.enabled = false;
        config.demo.max_delay_ms = 0;
        config
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Output format of the stdout log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log filter directive (trace, debug, info, warn, error or a full
    /// `EnvFilter` expression). `RUST_LOG` takes precedence.
    pub level: String,

    /// Format of the stdout layer.
    pub format: LogFormat,

    /// Directory for `combined.log` and `error.log`. No files when unset.
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            log_dir: None,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prefix prepended to every metric name.
    pub prefix: String,

    /// Upper bounds of the request duration histogram, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            prefix: "app_".to_string(),
            duration_buckets: vec![0.1, 0.5, 1.0, 2.0, 5.0],
        }
    }
}

/// Span export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Export spans. When false the tracer bootstrap is a no-op.
    pub enabled: bool,

    /// OTLP/gRPC collector endpoint.
    pub otlp_endpoint: String,

    /// Service name reported in logs and on the trace resource.
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: "pulse-demo".to_string(),
        }
    }
}

/// Demo route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Exclusive upper bound of the random delay on `/api/data`, in ms.
    pub max_delay_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { max_delay_ms: 1000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.metrics.prefix, "app_");
        assert_eq!(config.metrics.duration_buckets, vec![0.1, 0.5, 1.0, 2.0, 5.0]);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.demo.max_delay_ms, 1000);
        assert!(config.telemetry.enabled);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [logging]
            format = "pretty"

            [telemetry]
            service_name = "checkout"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.telemetry.service_name, "checkout");
        assert_eq!(config.telemetry.otlp_endpoint, "http://localhost:4317");
    }

    #[test]
    fn deployment_name_overrides_service_name() {
        let mut config = AppConfig::default();
        config.apply_overrides(Some("staging-eu".into()), None);
        assert_eq!(config.telemetry.service_name, "staging-eu");
        assert!(config.telemetry.enabled);
    }

    #[test]
    fn blank_deployment_name_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(Some("  ".into()), None);
        assert_eq!(config.telemetry.service_name, "pulse-demo");
    }

    #[test]
    fn test_env_disables_export() {
        let mut config = AppConfig::default();
        config.apply_overrides(None, Some("test".into()));
        assert!(!config.telemetry.enabled);
    }
}
