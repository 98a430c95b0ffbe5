//! Typed interfaces and the generic dispatcher behind them.
//!
//! A proxy is an ordinary struct holding a [`ProxyHandle`]; each trait
//! method forwards its name and arguments:
//!
//! ```ignore
//! pub trait Orders {
//!     fn get_order(&self, id: u64) -> ProxyResult<Order>;
//!     fn watch(&self, id: u64) -> ProxyResult<PendingCall<Order>>;
//! }
//!
//! pub struct OrdersProxy(ProxyHandle);
//!
//! impl RestInterface for OrdersProxy {
//!     type Proxy = Self;
//!     fn describe() -> InterfaceDescriptor { /* paths, verbs, params */ }
//!     fn create(handle: ProxyHandle) -> Self { Self(handle) }
//! }
//!
//! impl Orders for OrdersProxy {
//!     fn get_order(&self, id: u64) -> ProxyResult<Order> {
//!         self.0.call("get_order", args![id])
//!     }
//!     fn watch(&self, id: u64) -> ProxyResult<PendingCall<Order>> {
//!         self.0.call_async("watch", args![id])
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;

use crate::binding::metadata::InterfaceDescriptor;
use crate::binding::model::{CallKind, MethodBinding};
use crate::binding::resolver::MethodResolver;
use crate::client::rest_client::ClientCore;
use crate::error::{BindingError, ProxyResult};
use crate::invocation::invoker::Outcome;
use crate::invocation::pending::PendingCall;
use crate::observability::metrics;
use crate::observability::tracing::call_span;
use crate::request::binder::{bind, Arg};
use crate::request::builder::{build, RequestDescriptor};

/// A REST interface that can be turned into a proxy.
pub trait RestInterface: 'static {
    /// The generated implementation.
    type Proxy: Send + Sync + 'static;

    /// Interface metadata: paths, verbs, parameter roles, media types.
    fn describe() -> InterfaceDescriptor;

    /// Wrap a dispatcher bound to this interface.
    fn create(handle: ProxyHandle) -> Self::Proxy;
}

/// Dispatcher bound to one (client, interface) pair.
///
/// Cheap to clone; clones share the per-method binding cache.
#[derive(Clone)]
pub struct ProxyHandle {
    core: Arc<ClientCore>,
    resolver: Arc<MethodResolver>,
}

impl ProxyHandle {
    pub(crate) fn new(core: Arc<ClientCore>, descriptor: InterfaceDescriptor) -> Self {
        Self {
            core,
            resolver: Arc::new(MethodResolver::new(descriptor)),
        }
    }

    /// Interface name.
    pub fn interface(&self) -> &str {
        &self.resolver.interface().name
    }

    pub fn descriptor(&self) -> &InterfaceDescriptor {
        self.resolver.descriptor()
    }

    /// Resolved binding for `method`.
    pub fn binding(&self, method: &str) -> Result<Arc<MethodBinding>, BindingError> {
        self.resolver.resolve(method)
    }

    /// Build the request a call would send, without sending it.
    pub fn request(&self, method: &str, args: Vec<Arg>) -> ProxyResult<RequestDescriptor> {
        let binding = self.resolver.resolve(method)?;
        self.prepare(&binding, args)
    }

    /// Invoke `method` in the shape its declaration dictates.
    pub fn invoke<T>(&self, method: &str, args: Vec<Arg>) -> ProxyResult<Outcome<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.run(method, args, None)
    }

    /// Invoke a method declared with a plain return type.
    pub fn call<T>(&self, method: &str, args: Vec<Arg>) -> ProxyResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        match self.run(method, args, Some(CallKind::Blocking))? {
            Outcome::Ready(value) => Ok(value),
            Outcome::Pending(call) => call.wait(),
        }
    }

    /// Invoke a method declared to return a [`PendingCall`].
    pub fn call_async<T>(&self, method: &str, args: Vec<Arg>) -> ProxyResult<PendingCall<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        match self.run(method, args, Some(CallKind::Deferred))? {
            Outcome::Pending(call) => Ok(call),
            Outcome::Ready(value) => Ok(PendingCall::completed(value)),
        }
    }

    fn run<T>(&self, method: &str, args: Vec<Arg>, expected: Option<CallKind>) -> ProxyResult<Outcome<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let start = Instant::now();
        let binding = match self.resolver.resolve(method) {
            Ok(binding) => binding,
            Err(e) => {
                tracing::warn!(interface = %self.interface(), method, error = %e, "Method binding failed");
                metrics::record_call(self.interface(), method, metrics::OUTCOME_BINDING_ERROR, start);
                return Err(e.into());
            }
        };

        let span = call_span(&binding);
        let _entered = span.enter();

        let result = self.execute(&binding, args, expected);
        let outcome = match &result {
            Ok(Outcome::Ready(_)) => metrics::OUTCOME_OK,
            Ok(Outcome::Pending(_)) => metrics::OUTCOME_DISPATCHED,
            Err(e) => {
                tracing::warn!(error = %e, "Proxy call failed");
                metrics::outcome_of(e)
            }
        };
        metrics::record_call(&binding.interface.name, &binding.name, outcome, start);
        tracing::debug!(outcome, elapsed_ms = start.elapsed().as_millis() as u64, "Proxy call finished");

        result
    }

    fn execute<T>(
        &self,
        binding: &MethodBinding,
        args: Vec<Arg>,
        expected: Option<CallKind>,
    ) -> ProxyResult<Outcome<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        if let Some(expected) = expected {
            if binding.kind != expected {
                return Err(BindingError::ReturnShapeMismatch {
                    method: binding.name.clone(),
                    declared: binding.kind.as_str(),
                    invoked: expected.as_str(),
                }
                .into());
            }
        }

        let request = self.prepare(binding, args)?;
        tracing::debug!(verb = %request.method, url = %request.url, "Dispatching request");
        self.core.invoker.dispatch(binding, request)
    }

    fn prepare(&self, binding: &MethodBinding, args: Vec<Arg>) -> ProxyResult<RequestDescriptor> {
        let bound = bind(binding, args)?;
        let config = self.core.config.load_full();
        Ok(build(&config, binding, bound)?)
    }
}

impl fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandle")
            .field("interface", &self.interface())
            .field("cached_methods", &self.resolver.cached())
            .finish()
    }
}
