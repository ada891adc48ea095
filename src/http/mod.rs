//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, request span, trace context)
//!     → middleware/ (metrics + access log, error masking)
//!     → handlers.rs (demo routes, metrics scrape)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, RequestSpan, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer, ServerError};
