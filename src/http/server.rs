//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics, errors)
//! - Bind server to listener
//! - Serve until the shutdown signal fires
//! - Keep the metrics upkeep task running alongside the listener

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, DemoConfig};
use crate::http::handlers;
use crate::http::middleware::{handle_errors, observe_request, panic_response};
use crate::http::request::{MakeRequestUuid, RequestSpan, X_REQUEST_ID};
use crate::observability::{MetricsRegistry, UPKEEP_INTERVAL};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<MetricsRegistry>,
    pub demo: DemoConfig,
}

/// Errors raised while binding or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// HTTP server for the demo service.
pub struct HttpServer {
    router: Router,
    metrics: Arc<MetricsRegistry>,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server recording into `metrics`.
    pub fn new(config: AppConfig, metrics: Arc<MetricsRegistry>) -> Self {
        let state = AppState {
            metrics: metrics.clone(),
            demo: config.demo.clone(),
        };

        let router = build_router(&config, state);
        Self {
            router,
            metrics,
            config,
        }
    }

    /// Bind the configured listener address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = &self.config.listener.bind_address;
        TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.telemetry.service_name,
            "HTTP server starting"
        );

        let upkeep = tokio::spawn(
            self.metrics
                .clone()
                .run_upkeep_loop(UPKEEP_INTERVAL, shutdown.resubscribe()),
        );

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await;

        upkeep.abort();
        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let request_timeout = Duration::from_secs(config.listener.request_timeout_secs);
    let service_name = config.telemetry.service_name.as_str();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::root))
        .route("/api/data", get(handlers::sample_data))
        .route("/api/error", get(handlers::simulate_error))
        .route("/metrics", get(handlers::metrics))
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state.clone(), handle_errors))
        .layer(middleware::from_fn_with_state(state.clone(), observe_request))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(RequestSpan::new(service_name)))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
                .layer(TimeoutLayer::new(request_timeout)),
        )
}
