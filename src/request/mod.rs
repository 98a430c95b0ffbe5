//! Request construction subsystem.
//!
//! # Data Flow
//! ```text
//! MethodBinding + Vec<Arg>
//!     → binder.rs (roles, defaults, pending args)
//!     → BoundCall
//!     → builder.rs (target, headers, media types)
//!     → RequestDescriptor
//! ```

pub mod binder;
pub mod builder;
pub mod entity;
pub mod headers;

pub use binder::{bind, Arg, BoundCall, PendingArg};
pub use builder::{build, ClientConfig, ContentTypePrecedence, RequestDescriptor};
pub use entity::Entity;
pub use headers::{CallHeaders, HeaderMultiMap};
