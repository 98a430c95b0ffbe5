//! Declarative interface metadata.
//!
//! Descriptors are the metadata source the resolver reads: the equivalent of
//! annotations on an interface, its methods and their parameters. They are
//! assembled with builders, either in a `RestInterface::describe` impl or at
//! runtime.

use reqwest::Method;

use crate::binding::shape::{Describe, TypeShape};

/// Interface- or method-level annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Verb marker.
    HttpMethod(Method),
    /// Path fragment, may contain `{var}` templates.
    Path(String),
    /// Media types the endpoint produces (sent as `Accept`).
    Produces(Vec<String>),
    /// Media types the endpoint consumes (request `Content-Type`).
    Consumes(Vec<String>),
    /// Any other annotation; its `meta` annotations are inspected for a verb
    /// marker, which makes it a verb alias.
    Custom { name: String, meta: Vec<Annotation> },
}

impl Annotation {
    /// A custom annotation that aliases `verb`.
    pub fn verb_alias(name: impl Into<String>, verb: Method) -> Self {
        Annotation::Custom {
            name: name.into(),
            meta: vec![Annotation::HttpMethod(verb)],
        }
    }

    /// A custom annotation without meta annotations.
    pub fn marker(name: impl Into<String>) -> Self {
        Annotation::Custom {
            name: name.into(),
            meta: Vec::new(),
        }
    }

    /// The verb carried directly by this annotation.
    pub fn verb(&self) -> Option<&Method> {
        match self {
            Annotation::HttpMethod(m) => Some(m),
            _ => None,
        }
    }

    /// The verb carried by this annotation's own meta annotations.
    pub fn aliased_verb(&self) -> Option<&Method> {
        match self {
            Annotation::Custom { meta, .. } => meta.iter().find_map(Annotation::verb),
            _ => None,
        }
    }
}

/// Parameter-level annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamAnnotation {
    Path(String),
    Query(String),
    Matrix(String),
    Header(String),
    Cookie(String),
    Form(String),
    DefaultValue(String),
    /// Not a parameter-role annotation (validation markers and the like).
    Other(String),
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub annotations: Vec<ParamAnnotation>,
    pub shape: TypeShape,
}

impl ParamDescriptor {
    /// A parameter of declared type `T`.
    pub fn of<T: Describe + ?Sized>() -> Self {
        Self::with_shape(T::shape())
    }

    pub fn with_shape(shape: TypeShape) -> Self {
        Self {
            annotations: Vec::new(),
            shape,
        }
    }

    pub fn annotate(mut self, annotation: ParamAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn path(self, name: impl Into<String>) -> Self {
        self.annotate(ParamAnnotation::Path(name.into()))
    }

    pub fn query(self, name: impl Into<String>) -> Self {
        self.annotate(ParamAnnotation::Query(name.into()))
    }

    pub fn matrix(self, name: impl Into<String>) -> Self {
        self.annotate(ParamAnnotation::Matrix(name.into()))
    }

    pub fn header(self, name: impl Into<String>) -> Self {
        self.annotate(ParamAnnotation::Header(name.into()))
    }

    pub fn cookie(self, name: impl Into<String>) -> Self {
        self.annotate(ParamAnnotation::Cookie(name.into()))
    }

    pub fn form(self, name: impl Into<String>) -> Self {
        self.annotate(ParamAnnotation::Form(name.into()))
    }

    pub fn default_value(self, value: impl Into<String>) -> Self {
        self.annotate(ParamAnnotation::DefaultValue(value.into()))
    }

    /// The declared default, if any. The last declaration wins.
    pub fn default(&self) -> Option<&str> {
        self.annotations.iter().rev().find_map(|a| match a {
            ParamAnnotation::DefaultValue(v) => Some(v.as_str()),
            _ => None,
        })
    }
}

/// One declared method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub params: Vec<ParamDescriptor>,
    pub returns: TypeShape,
}

impl MethodDescriptor {
    /// A method returning `()` with no annotations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            params: Vec::new(),
            returns: TypeShape::Unit,
        }
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn verb(self, verb: Method) -> Self {
        self.annotate(Annotation::HttpMethod(verb))
    }

    pub fn get(self) -> Self {
        self.verb(Method::GET)
    }

    pub fn post(self) -> Self {
        self.verb(Method::POST)
    }

    pub fn put(self) -> Self {
        self.verb(Method::PUT)
    }

    pub fn delete(self) -> Self {
        self.verb(Method::DELETE)
    }

    pub fn patch(self) -> Self {
        self.verb(Method::PATCH)
    }

    pub fn head(self) -> Self {
        self.verb(Method::HEAD)
    }

    pub fn path(self, path: impl Into<String>) -> Self {
        self.annotate(Annotation::Path(path.into()))
    }

    pub fn produces<I, S>(self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotate(Annotation::Produces(types.into_iter().map(Into::into).collect()))
    }

    pub fn consumes<I, S>(self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotate(Annotation::Consumes(types.into_iter().map(Into::into).collect()))
    }

    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    /// Declare the return type.
    pub fn returns<T: Describe + ?Sized>(self) -> Self {
        self.returns_shape(T::shape())
    }

    pub fn returns_shape(mut self, shape: TypeShape) -> Self {
        self.returns = shape;
        self
    }
}

/// One declared interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub methods: Vec<MethodDescriptor>,
}

impl InterfaceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn path(self, path: impl Into<String>) -> Self {
        self.annotate(Annotation::Path(path.into()))
    }

    pub fn produces<I, S>(self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotate(Annotation::Produces(types.into_iter().map(Into::into).collect()))
    }

    pub fn consumes<I, S>(self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotate(Annotation::Consumes(types.into_iter().map(Into::into).collect()))
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

pub(crate) fn find_path(annotations: &[Annotation]) -> Option<&str> {
    annotations.iter().find_map(|a| match a {
        Annotation::Path(p) => Some(p.as_str()),
        _ => None,
    })
}

pub(crate) fn find_produces(annotations: &[Annotation]) -> Option<&[String]> {
    annotations.iter().find_map(|a| match a {
        Annotation::Produces(v) => Some(v.as_slice()),
        _ => None,
    })
}

pub(crate) fn find_consumes(annotations: &[Annotation]) -> Option<&[String]> {
    annotations.iter().find_map(|a| match a {
        Annotation::Consumes(v) => Some(v.as_slice()),
        _ => None,
    })
}
