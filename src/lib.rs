//! REST request proxies.
//!
//! Describe an HTTP interface once (verbs, path templates, parameter roles,
//! media types) and call it through a typed proxy. Each call is translated
//! into an outbound request and the response is decoded into the declared
//! return type, either blocking or as a [`PendingCall`].
//!
//! # Architecture Overview
//!
//! ```text
//!   proxy method call
//!         │
//!         ▼
//!   ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐
//!   │  binding   │──▶│  request   │──▶│ invocation │──▶│ transport  │──▶ HTTP
//!   │  resolver  │   │ binder +   │   │  invoker + │   │  reqwest + │
//!   │  (cached)  │   │  builder   │   │  adapters  │   │  tokio     │
//!   └────────────┘   └────────────┘   └────────────┘   └────────────┘
//!                                            │
//!                                            ▼
//!                                  value | PendingCall
//!
//!   client: proxy cache, shared default headers
//!   config / observability: settings, logging, metrics, spans
//! ```

// Core subsystems
pub mod binding;
pub mod client;
pub mod invocation;
pub mod request;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

pub use binding::{Describe, InterfaceDescriptor, MethodDescriptor, ParamDescriptor, TypeShape};
pub use client::{ProxyHandle, RestClient, RestInterface};
pub use error::{BindingError, ProxyError, ProxyResult, SerializationError, TransportError};
pub use invocation::{CallState, Completer, Outcome, PendingCall};
pub use request::{Arg, ClientConfig, ContentTypePrecedence, RequestDescriptor};
pub use transport::{HttpTransport, Response, ResponseSink, Transport};
