//! Configuration schema definitions.
//!
//! Every type derives Serde traits and defaults each field, so a minimal
//! file only needs an `endpoint`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::request::builder::ContentTypePrecedence;
use crate::transport::http::HttpTransportOptions;

/// Root configuration for a REST client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL every proxy path is appended to.
    pub endpoint: String,

    /// Headers sent with every call (name → value or list of values).
    pub default_headers: BTreeMap<String, HeaderValues>,

    /// Content type resolution order.
    pub content_type_precedence: ContentTypePrecedence,

    pub timeouts: TimeoutConfig,

    pub transport: TransportConfig,

    pub observability: ObservabilityConfig,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            default_headers: BTreeMap::new(),
            content_type_precedence: ContentTypePrecedence::default(),
            timeouts: TimeoutConfig::default(),
            transport: TransportConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ClientSettings {
    /// Options for the HTTP transport.
    pub fn transport_options(&self) -> HttpTransportOptions {
        HttpTransportOptions {
            connect_timeout: Duration::from_secs(self.timeouts.connect_secs),
            request_timeout: Duration::from_secs(self.timeouts.request_secs),
            worker_threads: self.transport.worker_threads,
            user_agent: self.transport.user_agent.clone(),
            pool_max_idle_per_host: self.transport.pool_max_idle_per_host,
        }
    }

    /// Default headers flattened in name order.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.default_headers
            .iter()
            .flat_map(|(name, values)| {
                values
                    .as_slice()
                    .iter()
                    .map(move |v| (name.clone(), v.clone()))
            })
            .collect()
    }
}

/// One header value or several.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

impl HeaderValues {
    pub fn as_slice(&self) -> &[String] {
        match self {
            HeaderValues::One(v) => std::slice::from_ref(v),
            HeaderValues::Many(vs) => vs,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time for request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// HTTP transport tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Runtime worker threads driving I/O and async callbacks.
    pub worker_threads: usize,

    pub user_agent: String,

    pub pool_max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let defaults = HttpTransportOptions::default();
        Self {
            worker_threads: defaults.worker_threads,
            user_agent: defaults.user_agent,
            pool_max_idle_per_host: defaults.pool_max_idle_per_host,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is unset (e.g. "info", "rest_proxy=debug").
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
