//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoint must be an absolute URL that can carry a path
//! - Header names and values must be valid on the wire
//! - Timeouts and worker counts must be non-zero
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: ClientSettings → Result<(), Vec<ValidationError>>

use reqwest::header::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::ClientSettings;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("endpoint `{endpoint}` is invalid: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("default header name `{0}` is invalid")]
    InvalidHeaderName(String),

    #[error("default header `{name}` has an invalid value")]
    InvalidHeaderValue { name: String },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("transport.worker_threads must be greater than zero")]
    ZeroWorkers,
}

/// Check a parsed configuration.
pub fn validate_config(settings: &ClientSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&settings.endpoint) {
        Ok(url) if url.cannot_be_a_base() => errors.push(ValidationError::InvalidEndpoint {
            endpoint: settings.endpoint.clone(),
            reason: "URL cannot carry a path".to_string(),
        }),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::InvalidEndpoint {
            endpoint: settings.endpoint.clone(),
            reason: e.to_string(),
        }),
    }

    for (name, values) in &settings.default_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
            continue;
        }
        if values.as_slice().iter().any(|v| HeaderValue::from_str(v).is_err()) {
            errors.push(ValidationError::InvalidHeaderValue { name: name.clone() });
        }
    }

    if settings.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if settings.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if settings.transport.worker_threads == 0 {
        errors.push(ValidationError::ZeroWorkers);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
