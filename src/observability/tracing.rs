//! Distributed tracing support.
//!
//! # Responsibilities
//! - Bootstrap the OpenTelemetry tracer provider once per process
//! - Bridge `tracing` spans into the span exporter
//! - Extract W3C trace context from incoming requests
//! - Flush and shut the exporter down on exit
//!
//! # Design Decisions
//! - Export can be switched off (test mode); the handle is then inert
//! - A broken exporter does not prevent startup, the service keeps
//!   logging without span export

use axum::http::HeaderMap;
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::{TraceError, TracerProvider as _};
use opentelemetry::{global, Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::Layer;

use crate::config::{AppConfig, TelemetryConfig};
use crate::observability::{logging, TelemetryError};

/// Process-wide observability handle.
///
/// Created once at startup; call [`Telemetry::shutdown`] before exit so
/// buffered spans are exported.
pub struct Telemetry {
    service_name: String,
    provider: Option<sdktrace::TracerProvider>,
}

impl Telemetry {
    /// Install logging and, when enabled, span export.
    pub fn init(config: &AppConfig) -> Result<Self, TelemetryError> {
        let service_name = config.telemetry.service_name.clone();

        let (provider, export_error) = if config.telemetry.enabled {
            match create_otel_provider(&config.telemetry) {
                Ok(provider) => (Some(provider), None),
                Err(e) => (None, Some(e)),
            }
        } else {
            (None, None)
        };

        let otel_layer = provider.as_ref().map(|provider| {
            let tracer = provider.tracer("pulse-demo");
            tracing_opentelemetry::layer().with_tracer(tracer).boxed()
        });

        logging::init_subscriber(&config.logging, otel_layer)?;

        if let Some(provider) = &provider {
            global::set_text_map_propagator(TraceContextPropagator::new());
            global::set_tracer_provider(provider.clone());
            tracing::info!(
                service = %service_name,
                endpoint = %config.telemetry.otlp_endpoint,
                "Span export enabled"
            );
        } else if let Some(e) = export_error {
            tracing::warn!(
                service = %service_name,
                endpoint = %config.telemetry.otlp_endpoint,
                error = %e,
                "Span exporter unavailable, continuing without export"
            );
        } else {
            tracing::info!(service = %service_name, "Span export disabled");
        }

        Ok(Self {
            service_name,
            provider,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Whether spans are being exported.
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }

    /// Flush pending spans and stop the exporter.
    pub fn shutdown(self) {
        let Some(provider) = self.provider else {
            return;
        };
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Span exporter shutdown failed");
        }
    }
}

fn create_otel_provider(config: &TelemetryConfig) -> Result<sdktrace::TracerProvider, TraceError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()?;

    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        config.service_name.clone(),
    )]);

    Ok(sdktrace::TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(resource)
        .build())
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

/// Parent context carried by `traceparent`/`tracestate` headers, if any.
pub fn extract_parent_context(headers: &HeaderMap) -> Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&HeaderExtractor(headers)))
}
