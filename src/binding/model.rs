//! Resolved bindings.
//!
//! Immutable once built; shared via `Arc` between calls.

use std::sync::Arc;

use reqwest::Method;

use crate::binding::metadata::{self, InterfaceDescriptor};
use crate::binding::shape::TypeShape;

/// Interface-level defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceBinding {
    pub name: String,
    /// Path prefix prepended to every method path.
    pub path: Option<String>,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
}

impl InterfaceBinding {
    pub fn from_descriptor(descriptor: &InterfaceDescriptor) -> Self {
        let annotations = &descriptor.annotations;
        Self {
            name: descriptor.name.clone(),
            path: metadata::find_path(annotations).map(str::to_string),
            produces: metadata::find_produces(annotations)
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            consumes: metadata::find_consumes(annotations)
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
        }
    }
}

/// Where an argument lands in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamRole {
    Path(String),
    Query(String),
    Matrix(String),
    Header(String),
    Body,
}

impl ParamRole {
    /// Template variable, query/matrix/header name; empty for the body.
    pub fn key(&self) -> &str {
        match self {
            ParamRole::Path(k) | ParamRole::Query(k) | ParamRole::Matrix(k) | ParamRole::Header(k) => k,
            ParamRole::Body => "",
        }
    }
}

/// A resolved parameter.
///
/// `roles` holds one entry per role annotation; a parameter with no role
/// annotation has the single role [`ParamRole::Body`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    pub index: usize,
    pub roles: Vec<ParamRole>,
    pub default_value: Option<String>,
    pub shape: TypeShape,
}

impl ParameterBinding {
    pub fn is_body(&self) -> bool {
        self.roles.iter().any(|r| matches!(r, ParamRole::Body))
    }
}

/// Execution shape decided by the declared return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Plain value: the caller blocks until the response arrives.
    Blocking,
    /// Async handle: a `PendingCall` is returned immediately.
    Deferred,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Blocking => "blocking",
            CallKind::Deferred => "deferred",
        }
    }
}

/// A fully resolved method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBinding {
    pub interface: Arc<InterfaceBinding>,
    pub name: String,
    pub verb: Method,
    /// Method path, appended to the interface path.
    pub path: Option<String>,
    pub params: Vec<ParameterBinding>,
    /// Method-level produced types, else the interface's.
    pub produces: Vec<String>,
    /// Method-level consumed types, else the interface's.
    pub consumes: Vec<String>,
    /// Declared return shape.
    pub returns: TypeShape,
    /// Payload shape (inside the async handle, if any).
    pub payload: TypeShape,
    pub kind: CallKind,
}

impl MethodBinding {
    pub fn body_param(&self) -> Option<&ParameterBinding> {
        self.params.iter().find(|p| p.is_body())
    }

    pub fn is_async(&self) -> bool {
        self.kind == CallKind::Deferred
    }

    /// `Interface::method`, for logs and metrics.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.interface.name, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_binding_from_descriptor() {
        let descriptor = InterfaceDescriptor::new("Orders")
            .path("/orders")
            .produces(["application/json"]);
        let binding = InterfaceBinding::from_descriptor(&descriptor);
        assert_eq!(binding.path.as_deref(), Some("/orders"));
        assert_eq!(binding.produces, vec!["application/json".to_string()]);
        assert!(binding.consumes.is_empty());
    }

    #[test]
    fn test_role_keys() {
        assert_eq!(ParamRole::Query("page".into()).key(), "page");
        assert_eq!(ParamRole::Body.key(), "");
    }
}
