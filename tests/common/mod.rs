//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use pulse_demo::config::AppConfig;
use pulse_demo::lifecycle::Shutdown;
use pulse_demo::observability::logging::{file_layers, COMBINED_LOG};
use pulse_demo::{HttpServer, MetricsRegistry};

/// Response pieces captured by [`send`].
pub struct Captured {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("body is not UTF-8")
    }
}

/// Router wired exactly like the binary, with its own metrics registry.
pub fn test_app(config: AppConfig) -> (Router, Arc<MetricsRegistry>) {
    let metrics = Arc::new(MetricsRegistry::new(&config.metrics).unwrap());
    let server = HttpServer::new(config, metrics.clone());
    (server.router(), metrics)
}

/// Send one request through `router` in-process.
pub async fn send(router: &Router, request: Request<Body>) -> Captured {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    Captured {
        status,
        headers,
        body,
    }
}

/// `GET uri` through `router` in-process.
pub async fn get(router: &Router, uri: &str) -> Captured {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

/// Start the full server on an ephemeral port.
pub async fn spawn_server(config: AppConfig) -> (SocketAddr, Shutdown) {
    let metrics = Arc::new(MetricsRegistry::new(&config.metrics).unwrap());
    let server = HttpServer::new(config, metrics);
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that never reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Value of the first series of `name` whose labels include every pair in
/// `labels`, read from a text exposition document.
pub fn sample_value(exposition: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .find(|line| {
            labels
                .iter()
                .all(|(key, value)| line.contains(&format!("{key}=\"{value}\"")))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

/// Log events written on the current thread while the capture is alive,
/// stored through the same file layers the binary uses.
pub struct LogCapture {
    dir: TempDir,
    _guard: DefaultGuard,
}

impl LogCapture {
    pub fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("info"))
            .with(file_layers(dir.path()).unwrap());
        let guard = tracing::subscriber::set_default(subscriber);
        Self { dir, _guard: guard }
    }

    /// Every JSON event in `file`.
    pub fn events(&self, file: &str) -> Vec<serde_json::Value> {
        std::fs::read_to_string(self.dir.path().join(file))
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).expect("log line is not JSON"))
            .collect()
    }

    /// First event in `combined.log` with the given message.
    pub fn find(&self, message: &str) -> Option<serde_json::Value> {
        self.events(COMBINED_LOG)
            .into_iter()
            .find(|event| event["fields"]["message"] == message)
    }
}
