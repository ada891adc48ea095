//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (bucket ordering, delay ceiling)
//! - Check the bind address parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// Largest accepted `demo.max_delay_ms`.
pub const MAX_DEMO_DELAY_MS: u64 = 60_000;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("listener.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("metrics.prefix must not be empty")]
    EmptyPrefix,

    #[error("metrics.prefix {0:?} contains characters outside [a-zA-Z0-9_:]")]
    InvalidPrefix(String),

    #[error("metrics.duration_buckets must not be empty")]
    NoBuckets,

    #[error("metrics.duration_buckets must be finite and strictly increasing")]
    UnorderedBuckets,

    #[error("telemetry.service_name must not be empty")]
    EmptyServiceName,

    #[error("telemetry.otlp_endpoint must not be empty when export is enabled")]
    EmptyEndpoint,

    #[error("demo.max_delay_ms {0} exceeds the 60000 ms ceiling")]
    DelayTooLong(u64),
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let prefix = &config.metrics.prefix;
    if prefix.is_empty() {
        errors.push(ValidationError::EmptyPrefix);
    } else if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        || prefix.starts_with(|c: char| c.is_ascii_digit())
    {
        errors.push(ValidationError::InvalidPrefix(prefix.clone()));
    }

    let buckets = &config.metrics.duration_buckets;
    if buckets.is_empty() {
        errors.push(ValidationError::NoBuckets);
    } else if buckets.iter().any(|b| !b.is_finite())
        || buckets.windows(2).any(|w| w[0] >= w[1])
    {
        errors.push(ValidationError::UnorderedBuckets);
    }

    if config.telemetry.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }
    if config.telemetry.enabled && config.telemetry.otlp_endpoint.trim().is_empty() {
        errors.push(ValidationError::EmptyEndpoint);
    }

    if config.demo.max_delay_ms > MAX_DEMO_DELAY_MS {
        errors.push(ValidationError::DelayTooLong(config.demo.max_delay_ms));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
