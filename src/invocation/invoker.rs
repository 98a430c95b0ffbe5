//! Invocation strategy.
//!
//! ```text
//! Blocking:  execute ─────────────────────────→ adapt → value | error
//! Deferred:  PendingCall (Unbound → Dispatched) → execute_async(sink)
//!            sink → Completed | Failed          (transport thread)
//! ```

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::binding::model::{CallKind, MethodBinding};
use crate::error::ProxyResult;
use crate::invocation::adapter::AdapterCache;
use crate::invocation::pending::PendingCall;
use crate::request::builder::RequestDescriptor;
use crate::transport::Transport;

/// Result of a proxy call, shaped by the declared return type.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Blocking call: the decoded payload.
    Ready(T),
    /// Async call: dispatched, settles later.
    Pending(PendingCall<T>),
}

impl<T> Outcome<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Outcome::Ready(v) => Some(v),
            Outcome::Pending(_) => None,
        }
    }

    pub fn into_pending(self) -> Option<PendingCall<T>> {
        match self {
            Outcome::Pending(call) => Some(call),
            Outcome::Ready(_) => None,
        }
    }

    /// The payload, blocking on a pending call if necessary.
    pub fn wait(self) -> ProxyResult<T> {
        match self {
            Outcome::Ready(v) => Ok(v),
            Outcome::Pending(call) => call.wait(),
        }
    }
}

/// Executes built requests and adapts the results.
pub struct Invoker {
    transport: Arc<dyn Transport>,
    adapters: AdapterCache,
}

impl Invoker {
    /// An invoker for the client identified by `client`.
    pub fn new(transport: Arc<dyn Transport>, client: u64) -> Self {
        Self {
            transport,
            adapters: AdapterCache::new(client),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn adapters(&self) -> &AdapterCache {
        &self.adapters
    }

    /// Execute `request` the way `binding` declares.
    ///
    /// Transport and decoding failures of a deferred call never surface
    /// here; they fail the returned [`PendingCall`].
    pub fn dispatch<T>(&self, binding: &MethodBinding, request: RequestDescriptor) -> ProxyResult<Outcome<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let adapter = self.adapters.get(&binding.payload);
        let url = request.url.to_string();

        match binding.kind {
            CallKind::Blocking => {
                let result = self.transport.execute(request);
                adapter.adapt(&url, result).map(Outcome::Ready)
            }
            CallKind::Deferred => {
                let (call, completer) = PendingCall::new();
                call.mark_dispatched();
                self.transport.execute_async(request, adapter.sink(url, completer));
                Ok(Outcome::Pending(call))
            }
        }
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker")
            .field("adapters", &self.adapters.len())
            .finish()
    }
}
