//! Request metrics and access log middleware.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::header::USER_AGENT,
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;
use crate::observability::RequestLabels;

/// Route label: the matched route template, or the raw path when no
/// route matched.
pub fn route_label(matched: Option<&MatchedPath>, path: &str) -> String {
    matched
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Times the request, then records the duration histogram, the request
/// counter and one "Request processed" log event.
pub async fn observe_request(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = route_label(
        request.extensions().get::<MatchedPath>(),
        request.uri().path(),
    );
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let labels = RequestLabels {
        method,
        route,
        status_code: response.status().as_u16(),
    };
    state.metrics.record_request(&labels, elapsed);

    tracing::info!(
        method = %labels.method,
        route = %labels.route,
        status_code = labels.status_code,
        duration_ms = elapsed.as_millis() as u64,
        user_agent = %user_agent,
        "Request processed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_requests_use_raw_path() {
        assert_eq!(route_label(None, "/nope"), "/nope");
    }
}
