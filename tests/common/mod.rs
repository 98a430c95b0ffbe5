//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Runtime;

use rest_proxy::binding::metadata::Annotation;
use rest_proxy::request::RequestDescriptor;
use rest_proxy::{
    args, describe_named, InterfaceDescriptor, MethodDescriptor, ParamDescriptor, PendingCall, ProxyHandle,
    ProxyResult, Response, ResponseSink, RestInterface, Transport, TransportError,
};

// ---------------------------------------------------------------------------
// Typed interface used across the scenarios
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(default)]
    pub items: Vec<String>,
}

describe_named!(Order, "order");

pub trait Orders {
    fn get_order(&self, id: u64) -> ProxyResult<Order>;
    fn get_order_async(&self, id: u64) -> ProxyResult<PendingCall<Order>>;
    fn search(&self, tags: &[&str], page: Option<u32>) -> ProxyResult<Vec<Order>>;
    fn create(&self, order: &Order, trace: Option<&str>) -> ProxyResult<Order>;
    fn tag(&self, id: u64, tags: &[&str]) -> ProxyResult<()>;
    fn purge(&self, id: u64) -> ProxyResult<()>;
}

pub struct OrdersProxy(pub ProxyHandle);

impl RestInterface for OrdersProxy {
    type Proxy = Self;

    fn describe() -> InterfaceDescriptor {
        InterfaceDescriptor::new("Orders")
            .path("/orders")
            .produces(["application/json"])
            .consumes(["application/json"])
            .method(
                MethodDescriptor::new("get_order")
                    .get()
                    .path("/{id}")
                    .param(ParamDescriptor::of::<u64>().path("id"))
                    .returns::<Order>(),
            )
            .method(
                MethodDescriptor::new("get_order_async")
                    .get()
                    .path("/{id}")
                    .param(ParamDescriptor::of::<u64>().path("id"))
                    .returns::<PendingCall<Order>>(),
            )
            .method(
                MethodDescriptor::new("search")
                    .get()
                    .param(ParamDescriptor::of::<Vec<String>>().query("tag"))
                    .param(ParamDescriptor::of::<Option<u32>>().query("page").default_value("1"))
                    .returns::<Vec<Order>>(),
            )
            .method(
                MethodDescriptor::new("create")
                    .post()
                    .param(ParamDescriptor::of::<Order>())
                    .param(ParamDescriptor::of::<Option<String>>().header("X-Trace"))
                    .returns::<Order>(),
            )
            .method(
                MethodDescriptor::new("tag")
                    .put()
                    .path("/{id}/tags")
                    .param(ParamDescriptor::of::<u64>().path("id"))
                    .param(ParamDescriptor::of::<Vec<String>>().header("X-Tag")),
            )
            .method(
                MethodDescriptor::new("purge")
                    .annotate(Annotation::verb_alias(
                        "Purge",
                        Method::from_bytes(b"PURGE").unwrap(),
                    ))
                    .path("/{id}")
                    .param(ParamDescriptor::of::<u64>().path("id")),
            )
    }

    fn create(handle: ProxyHandle) -> Self {
        OrdersProxy(handle)
    }
}

impl Orders for OrdersProxy {
    fn get_order(&self, id: u64) -> ProxyResult<Order> {
        self.0.call("get_order", args![id])
    }

    fn get_order_async(&self, id: u64) -> ProxyResult<PendingCall<Order>> {
        self.0.call_async("get_order_async", args![id])
    }

    fn search(&self, tags: &[&str], page: Option<u32>) -> ProxyResult<Vec<Order>> {
        self.0.call("search", args![tags, page])
    }

    fn create(&self, order: &Order, trace: Option<&str>) -> ProxyResult<Order> {
        self.0.call("create", args![order, trace])
    }

    fn tag(&self, id: u64, tags: &[&str]) -> ProxyResult<()> {
        self.0.call("tag", args![id, tags])
    }

    fn purge(&self, id: u64) -> ProxyResult<()> {
        self.0.call("purge", args![id])
    }
}

// ---------------------------------------------------------------------------
// In-memory transport
// ---------------------------------------------------------------------------

type Responder = dyn Fn(&RequestDescriptor) -> Result<Response, TransportError> + Send + Sync;

/// Records every request; async completions run on a fresh thread.
pub struct RecordingTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<RequestDescriptor>>,
    callback_threads: Mutex<Vec<ThreadId>>,
    drop_async: bool,
}

impl RecordingTransport {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&RequestDescriptor) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            callback_threads: Mutex::new(Vec::new()),
            drop_async: false,
        })
    }

    /// Always answers `status` with a JSON `body`.
    pub fn replying(status: u16, body: &'static str) -> Arc<Self> {
        Self::new(move |_| Ok(Response::new(status, body).with_header("Content-Type", "application/json")))
    }

    /// Always fails at the transport level.
    pub fn failing() -> Arc<Self> {
        Self::new(|req| {
            Err(TransportError::InvalidRequest(format!(
                "connection refused: {}",
                req.url
            )))
        })
    }

    /// Releases async sinks without calling them.
    pub fn dropping() -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(|_| Ok(Response::new(200, "{}"))),
            requests: Mutex::new(Vec::new()),
            callback_threads: Mutex::new(Vec::new()),
            drop_async: true,
        })
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> RequestDescriptor {
        self.requests.lock().unwrap().last().cloned().expect("no request was sent")
    }

    pub fn callback_threads(&self) -> Vec<ThreadId> {
        self.callback_threads.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn execute(&self, request: RequestDescriptor) -> Result<Response, TransportError> {
        let result = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        result
    }

    fn execute_async(&self, request: RequestDescriptor, sink: Box<dyn ResponseSink>) {
        let result = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        if self.drop_async {
            drop(sink);
            return;
        }

        let (tx, rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(thread::current().id());
            match result {
                Ok(response) => sink.on_success(response),
                Err(e) => sink.on_failure(e),
            }
        });
        if let Ok(id) = rx.recv() {
            self.callback_threads.lock().unwrap().push(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Raw TCP mock backend
// ---------------------------------------------------------------------------

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Reply produced by a mock handler.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl MockReply {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.into(),
        }
    }
}

/// HTTP/1.1 backend on `127.0.0.1:0`, driven by its own runtime so it can
/// serve blocking tests.
pub struct MockBackend {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    runtime: Option<Runtime>,
}

impl MockBackend {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&CapturedRequest) -> MockReply + Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        // Bound outside the runtime so the backend can start from async tests.
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        std_listener.set_nonblocking(true).unwrap();
        let addr = std_listener.local_addr().unwrap();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let sink = captured.clone();
        runtime.spawn(async move {
            let Ok(listener) = TcpListener::from_std(std_listener) else {
                return;
            };
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let handler = handler.clone();
                        let sink = sink.clone();
                        tokio::spawn(async move {
                            serve(socket, handler.as_ref(), &sink).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self {
            addr,
            captured,
            runtime: Some(runtime),
        }
    }

    /// Always answers with the same reply.
    pub fn fixed(reply: MockReply) -> Self {
        Self::start(move |_| reply.clone())
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn serve<F>(mut socket: TcpStream, handler: &F, captured: &Mutex<Vec<CapturedRequest>>)
where
    F: Fn(&CapturedRequest) -> MockReply + ?Sized,
{
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    let reply = handler(&request);
    captured.lock().unwrap().push(request);

    let reason = match reply.status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reason,
        reply.content_type,
        reply.body.len(),
        reply.body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(CapturedRequest {
        method,
        target,
        headers,
        body,
    })
}
