//! The REST client: shared configuration, transport and proxy cache.
//!
//! # Responsibilities
//! - Create typed proxies, one per interface type (`proxy`)
//! - Create uncached proxies from runtime descriptors (`dynamic_proxy`)
//! - Own the default headers every proxy of this client sends
//!
//! # Design Decisions
//! - Configuration is swapped copy-on-write; a call reads one snapshot
//! - Proxies hold the core, not the client, so the cache cannot form a cycle
//! - Cache construction runs under the entry lock; lookups stay concurrent

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use url::Url;

use crate::binding::metadata::InterfaceDescriptor;
use crate::client::proxy::{ProxyHandle, RestInterface};
use crate::config::loader::ConfigError;
use crate::config::schema::ClientSettings;
use crate::config::validation::{validate_config, ValidationError};
use crate::invocation::invoker::Invoker;
use crate::observability::metrics;
use crate::request::builder::{ClientConfig, ContentTypePrecedence};
use crate::request::headers::HeaderMultiMap;
use crate::transport::http::HttpTransport;
use crate::transport::Transport;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// State shared by a client and every proxy it created.
pub(crate) struct ClientCore {
    pub(crate) id: u64,
    pub(crate) config: ArcSwap<ClientConfig>,
    pub(crate) invoker: Invoker,
}

/// Entry point: creates proxies and holds client-wide defaults.
pub struct RestClient {
    core: Arc<ClientCore>,
    proxies: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl RestClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            core: Arc::new(ClientCore {
                id,
                config: ArcSwap::from_pointee(config),
                invoker: Invoker::new(transport, id),
            }),
            proxies: DashMap::new(),
        }
    }

    /// Build a client backed by [`HttpTransport`] from validated settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ConfigError> {
        validate_config(settings).map_err(ConfigError::Validation)?;

        let endpoint = Url::parse(&settings.endpoint).map_err(|e| {
            ConfigError::Validation(vec![ValidationError::InvalidEndpoint {
                endpoint: settings.endpoint.clone(),
                reason: e.to_string(),
            }])
        })?;
        let config = ClientConfig {
            endpoint,
            default_headers: settings.header_pairs().into_iter().collect(),
            content_type_precedence: settings.content_type_precedence,
        };
        let transport = HttpTransport::new(settings.transport_options())?;

        let client = Self::new(config, Arc::new(transport));
        let config = client.config();
        tracing::info!(
            client = client.id(),
            endpoint = %config.endpoint,
            default_headers = config.default_headers.len(),
            "REST client created"
        );
        Ok(client)
    }

    /// Process-unique id, used as the `client` metrics label.
    pub fn id(&self) -> u64 {
        self.core.id
    }

    /// The proxy for interface `I`, created on first use.
    ///
    /// Repeated calls return the same instance.
    pub fn proxy<I: RestInterface>(&self) -> Arc<I::Proxy> {
        let key = TypeId::of::<I>();

        let entry = match self.proxies.get(&key) {
            Some(entry) => entry.value().clone(),
            None => {
                let entry = self
                    .proxies
                    .entry(key)
                    .or_insert_with(|| {
                        let descriptor = I::describe();
                        tracing::debug!(interface = %descriptor.name, "Creating proxy");
                        Arc::new(I::create(self.handle(descriptor))) as Arc<dyn Any + Send + Sync>
                    })
                    .value()
                    .clone();
                metrics::set_cached_proxies(self.core.id, self.proxies.len());
                entry
            }
        };

        // Entries under `TypeId::of::<I>()` are only ever inserted as `I::Proxy`.
        match entry.downcast::<I::Proxy>() {
            Ok(proxy) => proxy,
            Err(_) => unreachable!(
                "proxy cache entry for {} has a foreign type",
                std::any::type_name::<I>()
            ),
        }
    }

    /// An uncached dispatcher for a descriptor assembled at runtime.
    pub fn dynamic_proxy(&self, descriptor: InterfaceDescriptor) -> ProxyHandle {
        self.handle(descriptor)
    }

    fn handle(&self, descriptor: InterfaceDescriptor) -> ProxyHandle {
        ProxyHandle::new(self.core.clone(), descriptor)
    }

    /// Number of cached typed proxies.
    pub fn cached_proxies(&self) -> usize {
        self.proxies.len()
    }

    /// Number of cached response adapters.
    pub fn cached_adapters(&self) -> usize {
        self.core.invoker.adapters().len()
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Arc<ClientConfig> {
        self.core.config.load_full()
    }

    pub fn endpoint(&self) -> Url {
        self.core.config.load().endpoint.clone()
    }

    pub fn set_endpoint(&self, endpoint: Url) {
        self.core.config.rcu(|current| {
            let mut next = ClientConfig::clone(current);
            next.endpoint = endpoint.clone();
            next
        });
    }

    pub fn set_content_type_precedence(&self, precedence: ContentTypePrecedence) {
        self.core.config.rcu(|current| {
            let mut next = ClientConfig::clone(current);
            next.content_type_precedence = precedence;
            next
        });
    }

    /// Snapshot of the default headers.
    pub fn default_headers(&self) -> HeaderMultiMap {
        self.core.config.load().default_headers.clone()
    }

    /// Set a default header, replacing existing values of that name.
    pub fn set_default_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        self.core.config.rcu(|current| {
            let mut next = ClientConfig::clone(current);
            next.default_headers.set(name.clone(), value.clone());
            next
        });
    }

    /// Add a default header value, keeping existing values of that name.
    pub fn add_default_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        self.core.config.rcu(|current| {
            let mut next = ClientConfig::clone(current);
            next.default_headers.append(name.clone(), value.clone());
            next
        });
    }

    /// Remove every default value of `name`. Returns true if any existed.
    pub fn remove_default_header(&self, name: &str) -> bool {
        let previous = self.core.config.rcu(|current| {
            let mut next = ClientConfig::clone(current);
            next.default_headers.remove(name);
            next
        });
        previous.default_headers.contains(name)
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("id", &self.core.id)
            .field("endpoint", &self.core.config.load().endpoint.as_str())
            .field("cached_proxies", &self.proxies.len())
            .field("invoker", &self.core.invoker)
            .finish()
    }
}
