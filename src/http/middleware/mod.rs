//! Per-request middleware.
//!
//! # Ordering
//! ```text
//! observe_request  (outer: sees the final status, including error 500s)
//!     → handle_errors  (counts, logs and masks handler errors)
//!         → catch panic  (panics become AppError::Panicked)
//!             → route handler
//! ```

pub mod errors;
pub mod observe;

pub use errors::{handle_errors, panic_response, ErrorBody};
pub use observe::{observe_request, route_label};
