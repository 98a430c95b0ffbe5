//! Error taxonomy for proxy calls.
//!
//! # Propagation
//! ```text
//! BindingError        → always returned synchronously, before any I/O
//! TransportError      → sync calls: returned; async calls: PendingCall fails
//! SerializationError  → treated exactly like TransportError
//! ```
//!
//! Nothing in this crate retries; retry policy belongs to the transport.

use thiserror::Error;

/// Maximum number of response body characters kept in error messages.
pub const BODY_SNIPPET_LIMIT: usize = 256;

/// Static mis-description of an interface or of a call against it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// No verb marker on the method, directly or through an alias.
    #[error("method `{method}` is not annotated with an HTTP method")]
    MissingVerb { method: String },

    /// A parameter carries a cookie role.
    #[error("cookie params are not supported: method `{method}` param {index}")]
    CookieParam { method: String, index: usize },

    /// A parameter carries a form role.
    #[error("form params are not supported: method `{method}` param {index}")]
    FormParam { method: String, index: usize },

    /// Two parameters without a role both want to be the request body.
    #[error("ambiguous body parameter in method `{method}`: params {first} and {second} are both unannotated")]
    AmbiguousBody {
        method: String,
        first: usize,
        second: usize,
    },

    /// The interface does not declare the invoked method.
    #[error("interface `{interface}` has no method `{method}`")]
    UnknownMethod { interface: String, method: String },

    /// Argument count differs from the declared parameter count.
    #[error("method `{method}` takes {expected} arguments but {actual} were supplied")]
    ArgumentCount {
        method: String,
        expected: usize,
        actual: usize,
    },

    /// A path parameter was absent and declared no default.
    #[error("path param `{name}` of method `{method}` (param {index}) has no value")]
    MissingPathArgument {
        method: String,
        index: usize,
        name: String,
    },

    /// A template variable survived substitution.
    #[error("path template variable `{variable}` of method `{method}` was not resolved")]
    UnresolvedTemplate { method: String, variable: String },

    /// The proxy expected a different call shape than the one declared.
    #[error("method `{method}` is declared {declared} but was invoked {invoked}")]
    ReturnShapeMismatch {
        method: String,
        declared: &'static str,
        invoked: &'static str,
    },

    /// The endpoint cannot carry path segments or the template is malformed.
    #[error("invalid target for method `{method}`: {reason}")]
    InvalidTarget { method: String, reason: String },

    /// An argument could not be serialized.
    #[error("argument {index} of method `{method}` could not be encoded: {reason}")]
    ArgumentEncoding {
        method: String,
        index: usize,
        reason: String,
    },
}

/// Failure reported by the transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, timeout or protocol failure.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx status code.
    #[error("HTTP {status} from {url}: {body_snippet}")]
    Status {
        url: String,
        status: u16,
        body_snippet: String,
    },

    /// The descriptor could not be turned into a wire request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The transport released the call without reporting an outcome.
    #[error("transport dropped the call to {url} without completing it")]
    Dropped { url: String },

    /// The transport's executor is unavailable.
    #[error("transport runtime error: {0}")]
    Runtime(String),
}

impl TransportError {
    /// HTTP status code, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// A response body did not match the declared payload shape.
#[derive(Debug, Error)]
#[error("failed to decode `{shape}` from {url}: {source}; body (truncated): {body_snippet}")]
pub struct SerializationError {
    pub shape: String,
    pub url: String,
    #[source]
    pub source: serde_json::Error,
    pub body_snippet: String,
}

/// Umbrella error returned by proxy calls.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// A future-valued argument resolved to a failure.
    #[error("pending argument {index} failed: {source}")]
    PendingArgument {
        index: usize,
        #[source]
        source: Box<ProxyError>,
    },
}

impl ProxyError {
    /// The binding error, if this is one.
    pub fn as_binding(&self) -> Option<&BindingError> {
        match self {
            ProxyError::Binding(e) => Some(e),
            _ => None,
        }
    }

    /// The transport error, if this is one.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            ProxyError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for proxy calls.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Truncate a response body for error messages.
pub fn snippet(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(limit).collect();
        out.push('…');
        out
    }
}
