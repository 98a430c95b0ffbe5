//! Transport abstraction.
//!
//! The proxy core only needs something that can execute a
//! [`RequestDescriptor`] either blocking or with a completion callback.
//! Connection pooling, TLS and retries live behind this trait.

pub mod http;

use crate::error::TransportError;
use crate::request::builder::RequestDescriptor;
use crate::request::headers::HeaderMultiMap;

pub use http::{HttpTransport, HttpTransportOptions};

/// A raw HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMultiMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMultiMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type")
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Completion callback for an asynchronous request.
///
/// Exactly one of the two methods is called, at most once; both consume the
/// sink.
pub trait ResponseSink: Send + 'static {
    fn on_success(self: Box<Self>, response: Response);
    fn on_failure(self: Box<Self>, error: TransportError);
}

/// Executes requests on behalf of proxies.
pub trait Transport: Send + Sync + 'static {
    /// Execute and block until the response arrives.
    fn execute(&self, request: RequestDescriptor) -> Result<Response, TransportError>;

    /// Start the request and return; `sink` is notified from the transport's
    /// own thread.
    fn execute_async(&self, request: RequestDescriptor, sink: Box<dyn ResponseSink>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_helpers() {
        let response = Response::new(204, Vec::new()).with_header("content-type", "text/plain");
        assert!(response.is_success());
        assert_eq!(response.content_type(), Some("text/plain"));
        assert!(!Response::new(404, "nope").is_success());
        assert_eq!(Response::new(200, "hi").text(), "hi");
    }
}
