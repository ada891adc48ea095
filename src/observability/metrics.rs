//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (request count, latency, errors, memory)
//! - Render the Prometheus text exposition format for `/metrics`
//! - Refresh collect-time gauges right before each scrape
//!
//! # Metrics
//! - `{prefix}http_request_duration_seconds` (histogram): latency by method, route, status_code
//! - `{prefix}http_requests_total` (counter): requests by method, route, status_code
//! - `{prefix}http_request_errors_total` (counter): handler errors by method, route, error_type
//! - `{prefix}memory_usage_bytes` (gauge): resident set size of the process
//!
//! # Design Decisions
//! - The registry owns its recorder; no global recorder is installed
//! - Recording goes through `metrics::with_local_recorder` (atomic updates)
//! - Rendering runs on the blocking pool
//! - Histogram samples are drained by a periodic upkeep task, not only by
//!   scrapes

use std::sync::Arc;
use std::time::Duration;

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::MetricsConfig;

/// Content type of the text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Period of the upkeep task, matching the exporter's own default.
pub const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Errors raised while building or rendering the registry.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid metrics configuration: {0}")]
    Build(#[from] BuildError),

    #[error("metrics rendering task failed: {0}")]
    Render(#[from] tokio::task::JoinError),
}

/// Label set attached to request count and latency observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLabels {
    pub method: String,
    pub route: String,
    pub status_code: u16,
}

/// Label set attached to handler error observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLabels {
    pub method: String,
    pub route: String,
    pub error_type: String,
}

#[derive(Debug, Clone)]
struct MetricNames {
    request_duration: String,
    requests_total: String,
    request_errors: String,
    memory_usage: String,
}

impl MetricNames {
    fn with_prefix(prefix: &str) -> Self {
        Self {
            request_duration: format!("{prefix}http_request_duration_seconds"),
            requests_total: format!("{prefix}http_requests_total"),
            request_errors: format!("{prefix}http_request_errors_total"),
            memory_usage: format!("{prefix}memory_usage_bytes"),
        }
    }
}

/// In-process metric store backing the `/metrics` endpoint.
pub struct MetricsRegistry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    names: MetricNames,
}

impl MetricsRegistry {
    /// Build a registry for the configured prefix and histogram buckets.
    pub fn new(config: &MetricsConfig) -> Result<Self, MetricsError> {
        let names = MetricNames::with_prefix(&config.prefix);

        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(names.request_duration.clone()),
                &config.duration_buckets,
            )?
            .build_recorder();
        let handle = recorder.handle();

        let registry = Self {
            recorder,
            handle,
            names,
        };
        registry.describe();
        Ok(registry)
    }

    fn describe(&self) {
        let names = &self.names;
        metrics::with_local_recorder(&self.recorder, || {
            describe_histogram!(
                names.request_duration.clone(),
                Unit::Seconds,
                "Duration of HTTP requests in seconds"
            );
            describe_counter!(
                names.requests_total.clone(),
                "Total number of HTTP requests"
            );
            describe_counter!(
                names.request_errors.clone(),
                "Total number of HTTP request errors"
            );
            describe_gauge!(
                names.memory_usage.clone(),
                Unit::Bytes,
                "Process memory usage"
            );
        });
    }

    /// Record one finished request.
    pub fn record_request(&self, labels: &RequestLabels, elapsed: Duration) {
        let names = &self.names;
        let status = labels.status_code.to_string();
        metrics::with_local_recorder(&self.recorder, || {
            histogram!(
                names.request_duration.clone(),
                "method" => labels.method.clone(),
                "route" => labels.route.clone(),
                "status_code" => status.clone()
            )
            .record(elapsed.as_secs_f64());

            counter!(
                names.requests_total.clone(),
                "method" => labels.method.clone(),
                "route" => labels.route.clone(),
                "status_code" => status
            )
            .increment(1);
        });
    }

    /// Record one error surfaced by a handler.
    pub fn record_error(&self, labels: &ErrorLabels) {
        let names = &self.names;
        metrics::with_local_recorder(&self.recorder, || {
            counter!(
                names.request_errors.clone(),
                "method" => labels.method.clone(),
                "route" => labels.route.clone(),
                "error_type" => labels.error_type.clone()
            )
            .increment(1);
        });
    }

    /// Update gauges whose value is sampled at scrape time.
    pub fn refresh_process_gauges(&self) {
        let Some(bytes) = resident_memory_bytes() else {
            return;
        };
        let names = &self.names;
        metrics::with_local_recorder(&self.recorder, || {
            gauge!(names.memory_usage.clone()).set(bytes as f64);
        });
    }

    /// Render the current state in the text exposition format.
    pub async fn render(&self) -> Result<String, MetricsError> {
        self.refresh_process_gauges();
        let handle = self.handle.clone();
        let body = tokio::task::spawn_blocking(move || handle.render()).await?;
        Ok(body)
    }

    /// Drain buffered histogram samples into their buckets.
    pub fn run_upkeep(&self) {
        self.handle.run_upkeep();
    }

    /// Run upkeep every `period` until `shutdown` fires.
    pub async fn run_upkeep_loop(
        self: Arc<Self>,
        period: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::debug!(period_ms = period.as_millis() as u64, "Metrics upkeep starting");

        let mut ticker = time::interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_upkeep();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Metrics upkeep received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn resident_memory_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_bytes() -> Option<u64> {
    None
}

/// Extract `VmRSS` (reported in kB) from a `/proc/<pid>/status` document.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_vm_rss(status: &str) -> Option<u64> {
    let value = status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))?
        .split_whitespace()
        .next()?;
    value.parse::<u64>().ok().map(|kb| kb * 1024)
}
