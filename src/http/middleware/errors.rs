//! Error handling middleware.
//! Turns handler errors and panics into an opaque 500.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{AppError, ErrorReport};
use crate::http::middleware::observe::route_label;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::ErrorLabels;

/// Body returned for every handler error.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorBody {
    pub fn internal(request_id: Option<String>) -> Self {
        Self {
            error: "Internal Server Error".to_string(),
            request_id,
        }
    }
}

pub async fn handle_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let route = route_label(request.extensions().get::<MatchedPath>(), &path);
    let request_id = request_id(request.headers()).map(str::to_owned);

    let mut response = next.run(request).await;

    // 1. Pass through anything that is not a handler error.
    let Some(report) = response.extensions_mut().remove::<Arc<ErrorReport>>() else {
        return response;
    };

    // 2. Count it.
    state.metrics.record_error(&ErrorLabels {
        method: method.clone(),
        route,
        error_type: report.kind.to_string(),
    });

    // 3. Log with full diagnostics.
    tracing::error!(
        error = %report.message,
        error_type = report.kind,
        source_chain = ?report.chain,
        backtrace = report.backtrace.as_deref().unwrap_or(""),
        path = %path,
        method = %method,
        "Error occurred"
    );

    // 4. Reply without leaking any of it.
    (response.status(), Json(ErrorBody::internal(request_id))).into_response()
}

/// Response for a panicking handler, consumed by `handle_errors` like any
/// other [`AppError`].
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::Panicked(message).into_response()
}
