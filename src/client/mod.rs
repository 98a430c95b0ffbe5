//! Client subsystem.
//!
//! # Data Flow
//! ```text
//! RestClient::proxy::<I>()  → proxy cache (one per interface type)
//!     → I::create(ProxyHandle)
//! proxy method → ProxyHandle::{invoke, call, call_async}
//!     → resolve → bind → build → dispatch
//! ```

pub mod proxy;
pub mod rest_client;

pub use proxy::{ProxyHandle, RestInterface};
pub use rest_client::RestClient;
