//! Call metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! every update is a no-op.
//!
//! # Metrics
//! - `rest_proxy_calls_total` (counter): calls by interface, method, outcome
//! - `rest_proxy_call_duration_seconds` (histogram): time until the result
//!   (blocking) or until dispatch (async)
//! - `rest_proxy_cached_proxies` (gauge): proxies held by a client, by `client`
//! - `rest_proxy_cached_adapters` (gauge): response adapters held by a client, by `client`
//!
//! The `client` label is the process-unique id from `RestClient::id`.

use std::time::Instant;

use crate::error::ProxyError;

/// Outcome label values.
pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_DISPATCHED: &str = "dispatched";
pub const OUTCOME_BINDING_ERROR: &str = "binding_error";
pub const OUTCOME_TRANSPORT_ERROR: &str = "transport_error";
pub const OUTCOME_SERIALIZATION_ERROR: &str = "serialization_error";
pub const OUTCOME_PENDING_ARGUMENT_ERROR: &str = "pending_argument_error";

/// Record one proxy call.
pub fn record_call(interface: &str, method: &str, outcome: &'static str, start: Instant) {
    ::metrics::counter!(
        "rest_proxy_calls_total",
        "interface" => interface.to_string(),
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!(
        "rest_proxy_call_duration_seconds",
        "interface" => interface.to_string(),
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn set_cached_proxies(client: u64, count: usize) {
    ::metrics::gauge!("rest_proxy_cached_proxies", "client" => client.to_string()).set(count as f64);
}

pub fn set_cached_adapters(client: u64, count: usize) {
    ::metrics::gauge!("rest_proxy_cached_adapters", "client" => client.to_string()).set(count as f64);
}

/// Outcome label for a failed call.
pub fn outcome_of(error: &ProxyError) -> &'static str {
    match error {
        ProxyError::Binding(_) => OUTCOME_BINDING_ERROR,
        ProxyError::Transport(_) => OUTCOME_TRANSPORT_ERROR,
        ProxyError::Serialization(_) => OUTCOME_SERIALIZATION_ERROR,
        ProxyError::PendingArgument { .. } => OUTCOME_PENDING_ARGUMENT_ERROR,
    }
}
