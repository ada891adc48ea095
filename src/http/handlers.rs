//! Route handlers.
//!
//! Static or near-static demo responses plus the metrics scrape endpoint.

use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::http::server::AppState;
use crate::observability::{MetricsError, EXPOSITION_CONTENT_TYPE};

pub const WELCOME_MESSAGE: &str = "Welcome to the pulse-demo service!";
pub const SAMPLE_DATA: &str = "Sample data response";
pub const SIMULATED_ERROR: &str = "Test error endpoint";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataResponse {
    pub data: String,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `GET /`
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

/// `GET /api/data`, answered after a random delay below `demo.max_delay_ms`.
///
/// The delay is a Tokio timer, so it is dropped with the request if the
/// client goes away or the server shuts down.
pub async fn sample_data(State(state): State<AppState>) -> Json<DataResponse> {
    let delay = random_delay(state.demo.max_delay_ms);
    tracing::debug!(delay_ms = delay.as_millis() as u64, "Delaying sample data");
    tokio::time::sleep(delay).await;

    Json(DataResponse {
        data: SAMPLE_DATA.to_string(),
    })
}

fn random_delay(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
}

/// `GET /api/error`, always fails.
pub async fn simulate_error() -> Result<(), AppError> {
    Err(AppError::Simulated(SIMULATED_ERROR.to_string()))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Response {
    exposition_response(state.metrics.render().await)
}

/// Scrape response for a render outcome: the exposition, or a plain 500.
pub fn exposition_response(rendered: Result<String, MetricsError>) -> Response {
    match rendered {
        Ok(body) => ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Error generating metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render metrics").into_response()
        }
    }
}

/// Fallback for unknown paths.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    tracing::debug!(path = %uri.path(), "No route matched");
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not Found" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_stays_below_ceiling() {
        for _ in 0..200 {
            assert!(random_delay(50) < Duration::from_millis(50));
        }
    }

    #[test]
    fn zero_ceiling_means_no_delay() {
        assert_eq!(random_delay(0), Duration::ZERO);
    }

    #[tokio::test]
    async fn render_failure_becomes_plain_500() {
        let join_error = tokio::spawn(async { panic!("render task died") })
            .await
            .unwrap_err();

        let response = exposition_response(Err(MetricsError::Render(join_error)));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CONTENT_TYPE).is_some_and(|v| v
            .to_str()
            .unwrap()
            .starts_with("text/plain")));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Failed to render metrics");
    }

    #[tokio::test]
    async fn successful_render_uses_exposition_content_type() {
        let response = exposition_response(Ok("app_up 1\n".to_string()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], EXPOSITION_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn error_route_returns_simulated_error() {
        let err = simulate_error().await.unwrap_err();
        assert_eq!(err.kind(), "SimulatedError");
        assert_eq!(err.to_string(), SIMULATED_ERROR);
    }
}
