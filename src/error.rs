//! Handler error type.
//!
//! Handlers return [`AppError`]; its `IntoResponse` impl produces a bare 500
//! and attaches an [`ErrorReport`] extension. The error middleware turns
//! that report into a counter increment, an error log event and the
//! generic response body, so the error text never reaches the client.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as _;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Error surfaced by a route handler.
#[derive(Debug, Error)]
pub enum AppError {
    /// Raised on purpose by the error simulation route.
    #[error("{0}")]
    Simulated(String),

    /// A handler panicked; carries the panic payload.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl AppError {
    /// Value of the `error_type` metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Simulated(_) => "SimulatedError",
            AppError::Panicked(_) => "Panic",
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Diagnostic details of a handler error, carried as a response extension.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
    pub chain: Vec<String>,
    pub backtrace: Option<String>,
}

impl ErrorReport {
    /// Capture the message, source chain and (when `RUST_BACKTRACE` is set)
    /// a backtrace of `error`.
    pub fn capture(error: &AppError) -> Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        let backtrace = Backtrace::capture();
        let backtrace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Self {
            kind: error.kind(),
            message: error.to_string(),
            chain,
            backtrace,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = ErrorReport::capture(&self);
        let mut response = self.status().into_response();
        response.extensions_mut().insert(Arc::new(report));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_name_the_variant() {
        assert_eq!(AppError::Simulated("x".into()).kind(), "SimulatedError");
        assert_eq!(AppError::Panicked("x".into()).kind(), "Panic");
    }

    #[test]
    fn response_carries_report_but_no_body() {
        let response = AppError::Simulated("Test error endpoint".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let report = response.extensions().get::<Arc<ErrorReport>>().unwrap();
        assert_eq!(report.kind, "SimulatedError");
        assert_eq!(report.message, "Test error endpoint");
        assert!(report.chain.is_empty());
    }

    #[test]
    fn panic_message_is_prefixed() {
        let report = ErrorReport::capture(&AppError::Panicked("index out of bounds".into()));
        assert_eq!(report.message, "handler panicked: index out of bounds");
    }
}
