//! Response adapters.
//!
//! One [`ResponseAdapter`] per distinct payload [`TypeShape`], built on first
//! use and shared afterwards. The same adapter decodes blocking responses and
//! completes [`PendingCall`](crate::invocation::pending::PendingCall)s from
//! transport callbacks.

use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::binding::shape::TypeShape;
use crate::error::{snippet, ProxyResult, SerializationError, TransportError, BODY_SNIPPET_LIMIT};
use crate::invocation::pending::Completer;
use crate::observability::metrics;
use crate::transport::{Response, ResponseSink};

/// Decoding rules for one payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseAdapter {
    shape: TypeShape,
}

impl ResponseAdapter {
    pub fn new(shape: TypeShape) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// Decode a response received from `url`.
    ///
    /// Non-2xx statuses fail with [`TransportError::Status`]; the body is
    /// only inspected for successful responses.
    pub fn decode<T: DeserializeOwned>(&self, url: &str, response: Response) -> ProxyResult<T> {
        if !response.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status,
                body_snippet: snippet(&response.text(), BODY_SNIPPET_LIMIT),
            }
            .into());
        }

        let empty = response.body.iter().all(u8::is_ascii_whitespace);
        let result = if self.shape == TypeShape::Unit || (empty && self.shape.accepts_empty()) {
            serde_json::from_value(Value::Null)
        } else if self.shape == TypeShape::String && is_text(&response) {
            serde_json::from_value(Value::String(response.text()))
        } else {
            serde_json::from_slice(&response.body)
        };

        result.map_err(|source| {
            SerializationError {
                shape: self.shape.signature(),
                url: url.to_string(),
                source,
                body_snippet: snippet(&response.text(), BODY_SNIPPET_LIMIT),
            }
            .into()
        })
    }

    /// Adapt a blocking transport result.
    pub fn adapt<T: DeserializeOwned>(
        &self,
        url: &str,
        result: Result<Response, TransportError>,
    ) -> ProxyResult<T> {
        self.decode(url, result?)
    }

    /// A completion sink that settles `completer` through this adapter.
    ///
    /// If the sink is dropped without being called the call fails with
    /// [`TransportError::Dropped`].
    pub fn sink<T>(self: &Arc<Self>, url: String, completer: Completer<T>) -> Box<dyn ResponseSink>
    where
        T: DeserializeOwned + Send + 'static,
    {
        Box::new(AdapterSink {
            adapter: self.clone(),
            url,
            completer: Some(completer),
        })
    }
}

fn is_text(response: &Response) -> bool {
    response
        .content_type()
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/"))
        .unwrap_or(false)
}

struct AdapterSink<T> {
    adapter: Arc<ResponseAdapter>,
    url: String,
    completer: Option<Completer<T>>,
}

impl<T: DeserializeOwned + Send + 'static> ResponseSink for AdapterSink<T> {
    fn on_success(mut self: Box<Self>, response: Response) {
        if let Some(completer) = self.completer.take() {
            match self.adapter.decode(&self.url, response) {
                Ok(value) => {
                    completer.complete(value);
                }
                Err(e) => {
                    completer.fail(e);
                }
            }
        }
    }

    fn on_failure(mut self: Box<Self>, error: TransportError) {
        if let Some(completer) = self.completer.take() {
            completer.fail(error.into());
        }
    }
}

impl<T> Drop for AdapterSink<T> {
    fn drop(&mut self) {
        if let Some(completer) = self.completer.take() {
            tracing::warn!(url = %self.url, "Transport released a call without completing it");
            completer.fail(
                TransportError::Dropped {
                    url: self.url.clone(),
                }
                .into(),
            );
        }
    }
}

/// Shape-keyed adapter cache.
#[derive(Debug)]
pub struct AdapterCache {
    adapters: DashMap<TypeShape, Arc<ResponseAdapter>>,
    /// Owning client, for the size gauge.
    client: u64,
}

impl AdapterCache {
    pub fn new(client: u64) -> Self {
        Self {
            adapters: DashMap::new(),
            client,
        }
    }

    /// The adapter for `shape`, built on first request.
    ///
    /// Construction happens under the entry lock, so concurrent first
    /// requests for one shape observe the same instance.
    pub fn get(&self, shape: &TypeShape) -> Arc<ResponseAdapter> {
        if let Some(adapter) = self.adapters.get(shape) {
            return adapter.value().clone();
        }

        let adapter = self
            .adapters
            .entry(shape.clone())
            .or_insert_with(|| {
                tracing::debug!(shape = %shape, "Building response adapter");
                Arc::new(ResponseAdapter::new(shape.clone()))
            })
            .value()
            .clone();
        metrics::set_cached_adapters(self.client, self.adapters.len());
        adapter
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyError;
    use crate::invocation::pending::{CallState, PendingCall};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: u64,
    }

    const URL: &str = "http://localhost/orders/42";

    #[test]
    fn test_decode_json() {
        let adapter = ResponseAdapter::new(TypeShape::named("order"));
        let order: Order = adapter.decode(URL, Response::new(200, r#"{"id":42}"#)).unwrap();
        assert_eq!(order, Order { id: 42 });
    }

    #[test]
    fn test_status_error_carries_snippet() {
        let adapter = ResponseAdapter::new(TypeShape::named("order"));
        let err = adapter
            .decode::<Order>(URL, Response::new(503, "overloaded"))
            .unwrap_err();
        match err {
            ProxyError::Transport(TransportError::Status { status, body_snippet, .. }) => {
                assert_eq!(status, 503);
                assert_eq!(body_snippet, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_shapes() {
        let unit = ResponseAdapter::new(TypeShape::Unit);
        unit.decode::<()>(URL, Response::new(204, Vec::new())).unwrap();
        unit.decode::<()>(URL, Response::new(200, "{\"ignored\":true}")).unwrap();

        let optional = ResponseAdapter::new(TypeShape::optional(TypeShape::named("order")));
        let none: Option<Order> = optional.decode(URL, Response::new(200, "  ")).unwrap();
        assert!(none.is_none());

        let strict = ResponseAdapter::new(TypeShape::named("order"));
        let err = strict.decode::<Order>(URL, Response::new(200, "")).unwrap_err();
        assert!(matches!(err, ProxyError::Serialization(_)));
    }

    #[test]
    fn test_text_payload() {
        let adapter = ResponseAdapter::new(TypeShape::String);
        let text: String = adapter
            .decode(URL, Response::new(200, "plain words").with_header("Content-Type", "text/plain"))
            .unwrap();
        assert_eq!(text, "plain words");

        let json: String = adapter.decode(URL, Response::new(200, "\"quoted\"")).unwrap();
        assert_eq!(json, "quoted");
    }

    #[test]
    fn test_serialization_error_names_shape() {
        let adapter = ResponseAdapter::new(TypeShape::list(TypeShape::String));
        let err = adapter
            .decode::<Vec<String>>(URL, Response::new(200, "{\"not\":\"a list\"}"))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("list-of-string"));
        assert!(msg.contains(URL));
    }

    #[test]
    fn test_sink_completes_call() {
        let adapter = Arc::new(ResponseAdapter::new(TypeShape::named("order")));
        let (call, completer) = PendingCall::<Order>::new();
        adapter
            .sink(URL.to_string(), completer)
            .on_success(Response::new(200, r#"{"id":42}"#));
        assert_eq!(call.state(), CallState::Completed);
        assert_eq!(call.wait().unwrap(), Order { id: 42 });
    }

    #[test]
    fn test_dropped_sink_fails_call() {
        let adapter = Arc::new(ResponseAdapter::new(TypeShape::named("order")));
        let (call, completer) = PendingCall::<Order>::new();
        drop(adapter.sink(URL.to_string(), completer));
        let err = call.wait().unwrap_err();
        assert!(matches!(
            err,
            ProxyError::Transport(TransportError::Dropped { .. })
        ));
    }

    #[test]
    fn test_cache_one_adapter_per_shape() {
        let cache = Arc::new(AdapterCache::new(0));
        let shape = TypeShape::map(TypeShape::String, TypeShape::named("order"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let shape = shape.clone();
                std::thread::spawn(move || cache.get(&shape))
            })
            .collect();
        let adapters: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(adapters.iter().all(|a| Arc::ptr_eq(a, &adapters[0])));
        assert_eq!(cache.len(), 1);
        cache.get(&TypeShape::list(TypeShape::String));
        assert_eq!(cache.len(), 2);
    }
}
