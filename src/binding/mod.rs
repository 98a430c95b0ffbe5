//! Binding resolution subsystem.
//!
//! # Data Flow
//! ```text
//! InterfaceDescriptor / MethodDescriptor (metadata.rs)
//!     → resolver.rs (verb, roles, media types, return shape)
//!     → MethodBinding (model.rs), cached per method
//! ```
//!
//! # Design Decisions
//! - Metadata is declared, not reflected
//! - Bindings are immutable and shared via Arc
//! - Type arguments are kept in full (shape.rs)

pub mod metadata;
pub mod model;
pub mod resolver;
pub mod shape;

pub use metadata::{Annotation, InterfaceDescriptor, MethodDescriptor, ParamAnnotation, ParamDescriptor};
pub use model::{CallKind, InterfaceBinding, MethodBinding, ParamRole, ParameterBinding};
pub use resolver::MethodResolver;
pub use shape::{Describe, TypeShape};
