//! pulse-demo: instrumented demo HTTP service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ request span ─▶ timeout
//!                                                     │
//!                                                     ▼
//!                              observe_request (timer, metrics, access log)
//!                                                     │
//!                                                     ▼
//!                              handle_errors (error counter, error log, 500 body)
//!                                                     │
//!                                                     ▼
//!                              catch panic ─▶ route handler
//!                                                     │
//!     Client Response                                 │
//!     ◀───────────────────────────────────────────────┘
//!
//!     Startup only: Telemetry::init (logging + OTLP span exporter)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use pulse_demo::config::resolve_config;
use pulse_demo::lifecycle::{shutdown_on_signal, Shutdown};
use pulse_demo::{HttpServer, MetricsRegistry, Telemetry};

#[derive(Parser)]
#[command(name = "pulse-demo")]
#[command(about = "Demo HTTP service with request logging, metrics and tracing", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "PULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref(), args.bind)?;
    let telemetry = Telemetry::init(&config)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        service = %telemetry.service_name(),
        bind_address = %config.listener.bind_address,
        exporting_spans = telemetry.is_exporting(),
        "pulse-demo starting"
    );

    let metrics = Arc::new(MetricsRegistry::new(&config.metrics)?);
    let server = HttpServer::new(config, metrics);
    let listener = server.bind().await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown_on_signal(shutdown));

    let result = server.run(listener, server_shutdown).await;

    telemetry.shutdown();
    result?;

    tracing::info!("Shutdown complete");
    Ok(())
}
