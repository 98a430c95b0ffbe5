//! Method descriptor resolution.
//!
//! # Responsibilities
//! - Find the HTTP verb (direct marker first, then verb aliases)
//! - Classify every parameter into roles, reject cookie/form roles
//! - Enforce at most one body parameter
//! - Resolve produced/consumed media types (method first, then interface)
//! - Unwrap async-handle return types
//!
//! # Design Decisions
//! - Successful resolutions are cached per method name
//! - Failures are not cached; every call reports them again

use std::sync::Arc;

use dashmap::DashMap;
use reqwest::Method;

use crate::binding::metadata::{self, InterfaceDescriptor, MethodDescriptor, ParamAnnotation};
use crate::binding::model::{
    CallKind, InterfaceBinding, MethodBinding, ParamRole, ParameterBinding,
};
use crate::error::BindingError;

/// Resolves and caches the methods of one interface.
#[derive(Debug)]
pub struct MethodResolver {
    descriptor: InterfaceDescriptor,
    interface: Arc<InterfaceBinding>,
    cache: DashMap<String, Arc<MethodBinding>>,
}

impl MethodResolver {
    pub fn new(descriptor: InterfaceDescriptor) -> Self {
        let interface = Arc::new(InterfaceBinding::from_descriptor(&descriptor));
        Self {
            descriptor,
            interface,
            cache: DashMap::new(),
        }
    }

    pub fn interface(&self) -> &Arc<InterfaceBinding> {
        &self.interface
    }

    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    /// Resolve `method`, reusing a cached binding when available.
    pub fn resolve(&self, method: &str) -> Result<Arc<MethodBinding>, BindingError> {
        if let Some(cached) = self.cache.get(method) {
            return Ok(cached.value().clone());
        }

        let descriptor = self
            .descriptor
            .find_method(method)
            .ok_or_else(|| BindingError::UnknownMethod {
                interface: self.interface.name.clone(),
                method: method.to_string(),
            })?;

        let binding = Arc::new(resolve(&self.interface, descriptor)?);
        tracing::debug!(
            interface = %self.interface.name,
            method = %method,
            verb = %binding.verb,
            kind = binding.kind.as_str(),
            "Method binding resolved"
        );

        Ok(self
            .cache
            .entry(method.to_string())
            .or_insert(binding)
            .value()
            .clone())
    }

    /// Number of cached bindings.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Resolve one method against its interface.
pub fn resolve(
    interface: &Arc<InterfaceBinding>,
    method: &MethodDescriptor,
) -> Result<MethodBinding, BindingError> {
    let verb = resolve_verb(method).ok_or_else(|| BindingError::MissingVerb {
        method: method.name.clone(),
    })?;

    let params = resolve_params(method)?;

    let produces = metadata::find_produces(&method.annotations)
        .map(<[String]>::to_vec)
        .unwrap_or_else(|| interface.produces.clone());
    let consumes = metadata::find_consumes(&method.annotations)
        .map(<[String]>::to_vec)
        .unwrap_or_else(|| interface.consumes.clone());

    let returns = method.returns.clone();
    let payload = returns.unwrapped().clone();
    let kind = if returns.is_async_handle() {
        CallKind::Deferred
    } else {
        CallKind::Blocking
    };

    Ok(MethodBinding {
        interface: interface.clone(),
        name: method.name.clone(),
        verb,
        path: metadata::find_path(&method.annotations).map(str::to_string),
        params,
        produces,
        consumes,
        returns,
        payload,
        kind,
    })
}

/// Direct verb marker first, then any annotation that itself carries one.
fn resolve_verb(method: &MethodDescriptor) -> Option<Method> {
    method
        .annotations
        .iter()
        .find_map(|a| a.verb())
        .or_else(|| method.annotations.iter().find_map(|a| a.aliased_verb()))
        .cloned()
}

fn resolve_params(method: &MethodDescriptor) -> Result<Vec<ParameterBinding>, BindingError> {
    let mut bindings = Vec::with_capacity(method.params.len());
    let mut body_index: Option<usize> = None;

    for (index, param) in method.params.iter().enumerate() {
        let mut roles = Vec::new();
        for annotation in &param.annotations {
            match annotation {
                ParamAnnotation::Path(k) => roles.push(ParamRole::Path(k.clone())),
                ParamAnnotation::Query(k) => roles.push(ParamRole::Query(k.clone())),
                ParamAnnotation::Matrix(k) => roles.push(ParamRole::Matrix(k.clone())),
                ParamAnnotation::Header(k) => roles.push(ParamRole::Header(k.clone())),
                ParamAnnotation::Form(_) => {
                    return Err(BindingError::FormParam {
                        method: method.name.clone(),
                        index,
                    })
                }
                ParamAnnotation::Cookie(_) => {
                    return Err(BindingError::CookieParam {
                        method: method.name.clone(),
                        index,
                    })
                }
                ParamAnnotation::DefaultValue(_) | ParamAnnotation::Other(_) => {}
            }
        }

        if roles.is_empty() {
            if let Some(first) = body_index {
                return Err(BindingError::AmbiguousBody {
                    method: method.name.clone(),
                    first,
                    second: index,
                });
            }
            body_index = Some(index);
            roles.push(ParamRole::Body);
        }

        bindings.push(ParameterBinding {
            index,
            roles,
            default_value: param.default().map(str::to_string),
            shape: param.shape.clone(),
        });
    }

    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::metadata::{Annotation, ParamDescriptor};
    use crate::binding::shape::TypeShape;

    fn orders() -> InterfaceDescriptor {
        InterfaceDescriptor::new("Orders")
            .path("/orders")
            .produces(["application/json"])
            .consumes(["application/json"])
            .method(
                MethodDescriptor::new("get_order")
                    .get()
                    .path("/{id}")
                    .param(ParamDescriptor::of::<u64>().path("id"))
                    .returns::<serde_json::Value>(),
            )
            .method(
                MethodDescriptor::new("get_order_async")
                    .get()
                    .path("/{id}")
                    .produces(["application/xml"])
                    .param(ParamDescriptor::of::<u64>().path("id"))
                    .returns_shape(TypeShape::pending(TypeShape::list(TypeShape::String))),
            )
            .method(MethodDescriptor::new("no_verb").path("/x"))
            .method(
                MethodDescriptor::new("two_bodies")
                    .post()
                    .param(ParamDescriptor::of::<String>())
                    .param(ParamDescriptor::of::<String>().annotate(ParamAnnotation::Other("NotNull".into())))
            )
            .method(
                MethodDescriptor::new("with_cookie")
                    .get()
                    .param(ParamDescriptor::of::<String>().query("q"))
                    .param(ParamDescriptor::of::<String>().cookie("session")),
            )
            .method(
                MethodDescriptor::new("with_form")
                    .post()
                    .param(ParamDescriptor::of::<String>().form("field")),
            )
            .method(
                MethodDescriptor::new("aliased")
                    .annotate(Annotation::marker("Timed"))
                    .annotate(Annotation::verb_alias("Purge", Method::from_bytes(b"PURGE").unwrap())),
            )
            .method(
                MethodDescriptor::new("direct_wins")
                    .annotate(Annotation::verb_alias("Purge", Method::from_bytes(b"PURGE").unwrap()))
                    .delete(),
            )
    }

    #[test]
    fn test_resolve_sync_method() {
        let resolver = MethodResolver::new(orders());
        let binding = resolver.resolve("get_order").unwrap();
        assert_eq!(binding.verb, Method::GET);
        assert_eq!(binding.path.as_deref(), Some("/{id}"));
        assert_eq!(binding.kind, CallKind::Blocking);
        assert_eq!(binding.payload, TypeShape::Json);
        assert_eq!(binding.produces, vec!["application/json".to_string()]);
        assert_eq!(binding.params[0].roles, vec![ParamRole::Path("id".into())]);
        assert!(binding.body_param().is_none());
    }

    #[test]
    fn test_resolve_async_unwraps_payload() {
        let resolver = MethodResolver::new(orders());
        let binding = resolver.resolve("get_order_async").unwrap();
        assert_eq!(binding.kind, CallKind::Deferred);
        assert_eq!(binding.payload, TypeShape::list(TypeShape::String));
        // Method-level produces overrides the interface.
        assert_eq!(binding.produces, vec!["application/xml".to_string()]);
        assert_eq!(binding.consumes, vec!["application/json".to_string()]);
    }

    #[test]
    fn test_missing_verb() {
        let resolver = MethodResolver::new(orders());
        let err = resolver.resolve("no_verb").unwrap_err();
        assert_eq!(err, BindingError::MissingVerb { method: "no_verb".into() });
        // Not cached.
        assert!(resolver.resolve("no_verb").is_err());
        assert_eq!(resolver.cached(), 0);
    }

    #[test]
    fn test_ambiguous_body() {
        let resolver = MethodResolver::new(orders());
        let err = resolver.resolve("two_bodies").unwrap_err();
        assert_eq!(
            err,
            BindingError::AmbiguousBody {
                method: "two_bodies".into(),
                first: 0,
                second: 1
            }
        );
        assert!(err.to_string().contains("two_bodies"));
    }

    #[test]
    fn test_cookie_and_form_rejected() {
        let resolver = MethodResolver::new(orders());
        let err = resolver.resolve("with_cookie").unwrap_err();
        assert_eq!(
            err,
            BindingError::CookieParam {
                method: "with_cookie".into(),
                index: 1
            }
        );
        let err = resolver.resolve("with_form").unwrap_err();
        assert!(err.to_string().contains("form params are not supported"));
    }

    #[test]
    fn test_verb_alias() {
        let resolver = MethodResolver::new(orders());
        assert_eq!(resolver.resolve("aliased").unwrap().verb.as_str(), "PURGE");
        assert_eq!(resolver.resolve("direct_wins").unwrap().verb, Method::DELETE);
    }

    #[test]
    fn test_unknown_method_and_cache() {
        let resolver = MethodResolver::new(orders());
        assert!(matches!(
            resolver.resolve("missing"),
            Err(BindingError::UnknownMethod { .. })
        ));
        let a = resolver.resolve("get_order").unwrap();
        let b = resolver.resolve("get_order").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(resolver.cached(), 1);
    }
}
