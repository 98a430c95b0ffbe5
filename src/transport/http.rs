//! HTTP transport over `reqwest`.
//!
//! # Responsibilities
//! - Own the I/O runtime that drives the `reqwest` client
//! - Translate a [`RequestDescriptor`] into a wire request
//! - Blocking execution via `block_on`, callback execution via `spawn`
//!
//! # Design Decisions
//! - Blocking calls are refused from inside an async runtime instead of
//!   deadlocking or panicking
//! - Callbacks run on runtime worker threads, never on the caller's thread

use std::fmt;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tokio::runtime::{Handle, Runtime};

use crate::error::TransportError;
use crate::request::builder::RequestDescriptor;
use crate::request::entity::APPLICATION_JSON;
use crate::request::headers::HeaderMultiMap;
use crate::transport::{Response, ResponseSink, Transport};

/// Tunables for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub worker_threads: usize,
    pub user_agent: String,
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpTransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            worker_threads: 2,
            user_agent: format!("rest-proxy/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 16,
        }
    }
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
pub struct HttpTransport {
    client: reqwest::Client,
    /// Present when the transport owns its runtime.
    runtime: Option<Runtime>,
    handle: Handle,
}

impl HttpTransport {
    /// Create a transport with its own multi-threaded runtime.
    pub fn new(options: HttpTransportOptions) -> Result<Self, TransportError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(options.worker_threads.max(1))
            .thread_name("rest-proxy-io")
            .enable_all()
            .build()
            .map_err(|e| TransportError::Runtime(format!("failed to start runtime: {e}")))?;
        let handle = runtime.handle().clone();
        let client = {
            let _guard = runtime.enter();
            build_client(&options)?
        };

        tracing::debug!(
            worker_threads = options.worker_threads.max(1),
            connect_timeout_secs = options.connect_timeout.as_secs(),
            request_timeout_secs = options.request_timeout.as_secs(),
            "HTTP transport started"
        );

        Ok(Self {
            client,
            runtime: Some(runtime),
            handle,
        })
    }

    /// Create a transport that runs on an existing runtime.
    pub fn with_handle(handle: Handle, options: HttpTransportOptions) -> Result<Self, TransportError> {
        let client = {
            let _guard = handle.enter();
            build_client(&options)?
        };
        Ok(Self {
            client,
            runtime: None,
            handle,
        })
    }

    fn prepare(&self, request: RequestDescriptor) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut builder = self.client.request(request.method.clone(), request.url.clone());

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if !request.accept.is_empty() {
            builder = builder.header(ACCEPT, request.accept.join(", "));
        }
        if let Some(entity) = &request.body {
            let content_type = request.content_type.as_deref().unwrap_or(APPLICATION_JSON);
            let bytes = entity.encode(Some(content_type))?;
            builder = builder.header(CONTENT_TYPE, content_type).body(bytes);
        }

        Ok(builder)
    }
}

fn build_client(options: &HttpTransportOptions) -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .connect_timeout(options.connect_timeout)
        .timeout(options.request_timeout)
        .user_agent(options.user_agent.clone())
        .pool_max_idle_per_host(options.pool_max_idle_per_host)
        .build()
        .map_err(|e| TransportError::Runtime(format!("failed to build HTTP client: {e}")))
}

async fn send(builder: reqwest::RequestBuilder, url: String) -> Result<Response, TransportError> {
    let response = builder.send().await.map_err(|source| TransportError::Request {
        url: url.clone(),
        source,
    })?;

    let status = response.status().as_u16();
    let headers: HeaderMultiMap = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .bytes()
        .await
        .map_err(|source| TransportError::Request { url, source })?
        .to_vec();

    Ok(Response {
        status,
        headers,
        body,
    })
}

impl Transport for HttpTransport {
    fn execute(&self, request: RequestDescriptor) -> Result<Response, TransportError> {
        if Handle::try_current().is_ok() {
            return Err(TransportError::Runtime(
                "blocking call made from inside an async runtime; declare the method async".to_string(),
            ));
        }
        let url = request.url.to_string();
        let builder = self.prepare(request)?;
        self.handle.block_on(send(builder, url))
    }

    fn execute_async(&self, request: RequestDescriptor, sink: Box<dyn ResponseSink>) {
        let url = request.url.to_string();
        let builder = match self.prepare(request) {
            Ok(builder) => builder,
            Err(e) => {
                sink.on_failure(e);
                return;
            }
        };

        self.handle.spawn(async move {
            match send(builder, url).await {
                Ok(response) => sink.on_success(response),
                Err(e) => sink.on_failure(e),
            }
        });
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("owns_runtime", &self.runtime.is_some())
            .finish()
    }
}
