//! Parameter binding.
//!
//! # Responsibilities
//! - Walk call arguments against the resolved parameter bindings
//! - Wait on future-valued arguments
//! - Apply declared defaults to absent arguments
//! - Collect path/query/matrix substitutions, call headers and the body
//!
//! # Design Decisions
//! - Waiting on a pending argument blocks the calling thread, even when the
//!   method itself is asynchronous
//! - Scalar header arguments replace client defaults; collections append

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::binding::model::{MethodBinding, ParamRole};
use crate::error::{BindingError, ProxyError, ProxyResult};
use crate::invocation::pending::PendingCall;
use crate::request::entity::{text_of, Entity};
use crate::request::headers::CallHeaders;

/// One runtime call argument.
pub enum Arg {
    /// No value (`None` / null).
    Absent,
    Scalar(Value),
    /// A multi-valued collection.
    Many(Vec<Value>),
    /// A value that is still being computed.
    Pending(Box<dyn PendingArg>),
    /// The value could not be serialized.
    Invalid(String),
}

impl Arg {
    /// Serialize `value` into an argument.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Self::from_value(v),
            Err(e) => Arg::Invalid(e.to_string()),
        }
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Arg::Absent,
            Value::Array(items) => Arg::Many(items),
            other => Arg::Scalar(other),
        }
    }

    /// A future-valued argument; the binder waits for it.
    pub fn pending<T: Serialize + Send + 'static>(call: PendingCall<T>) -> Self {
        Arg::Pending(Box::new(call))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Arg::Absent)
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Absent => f.write_str("Absent"),
            Arg::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            Arg::Many(v) => f.debug_tuple("Many").field(v).finish(),
            Arg::Pending(_) => f.write_str("Pending(..)"),
            Arg::Invalid(reason) => f.debug_tuple("Invalid").field(reason).finish(),
        }
    }
}

/// A future-valued argument.
pub trait PendingArg: Send {
    /// Block until the value is available.
    fn resolve(self: Box<Self>) -> ProxyResult<Arg>;
}

impl<T: Serialize + Send + 'static> PendingArg for PendingCall<T> {
    fn resolve(self: Box<Self>) -> ProxyResult<Arg> {
        let value = (*self).wait()?;
        Ok(Arg::of(&value))
    }
}

/// Build an argument list from serializable values.
///
/// ```ignore
/// handle.call::<Order>("get_order", args![42u64, "trace-1"])
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::request::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::request::Arg::of(&$arg)),+]
    };
}

/// Everything one call contributes to its request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundCall {
    /// Template substitutions, in declaration order.
    pub path_params: Vec<(String, String)>,
    pub query_params: Vec<(String, String)>,
    pub matrix_params: Vec<(String, String)>,
    pub headers: CallHeaders,
    pub body: Option<Entity>,
}

/// Bind `args` against `binding`.
pub fn bind(binding: &MethodBinding, args: Vec<Arg>) -> ProxyResult<BoundCall> {
    if args.len() != binding.params.len() {
        return Err(BindingError::ArgumentCount {
            method: binding.name.clone(),
            expected: binding.params.len(),
            actual: args.len(),
        }
        .into());
    }

    let mut bound = BoundCall::default();

    for (param, arg) in binding.params.iter().zip(args) {
        let index = param.index;

        let arg = match arg {
            Arg::Pending(pending) => {
                tracing::debug!(method = %binding.name, index, "Waiting on pending argument");
                pending.resolve().map_err(|e| ProxyError::PendingArgument {
                    index,
                    source: Box::new(e),
                })?
            }
            other => other,
        };

        let arg = match arg {
            Arg::Absent => match &param.default_value {
                Some(default) => Arg::Scalar(Value::String(default.clone())),
                None => Arg::Absent,
            },
            Arg::Invalid(reason) => {
                return Err(BindingError::ArgumentEncoding {
                    method: binding.name.clone(),
                    index,
                    reason,
                }
                .into())
            }
            other => other,
        };

        for role in &param.roles {
            match role {
                ParamRole::Path(name) => {
                    let value = joined(&arg).ok_or_else(|| BindingError::MissingPathArgument {
                        method: binding.name.clone(),
                        index,
                        name: name.clone(),
                    })?;
                    bound.path_params.push((name.clone(), value));
                }
                ParamRole::Matrix(name) => {
                    if let Some(value) = joined(&arg) {
                        bound.matrix_params.push((name.clone(), value));
                    }
                }
                ParamRole::Query(name) => {
                    for value in values(&arg) {
                        bound.query_params.push((name.clone(), value));
                    }
                }
                ParamRole::Header(name) => match &arg {
                    Arg::Scalar(v) => bound.headers.replace(name.clone(), text_of(v)),
                    Arg::Many(items) => {
                        for item in items {
                            bound.headers.append(name.clone(), text_of(item));
                        }
                    }
                    _ => {}
                },
                ParamRole::Body => {
                    bound.body = match &arg {
                        Arg::Scalar(v) => Some(Entity::new(v.clone(), param.shape.clone())),
                        Arg::Many(items) => Some(Entity::new(
                            Value::Array(items.clone()),
                            param.shape.clone(),
                        )),
                        _ => None,
                    };
                }
            }
        }
    }

    Ok(bound)
}

fn joined(arg: &Arg) -> Option<String> {
    match arg {
        Arg::Scalar(v) => Some(text_of(v)),
        Arg::Many(items) => Some(items.iter().map(text_of).collect::<Vec<_>>().join(",")),
        _ => None,
    }
}

fn values(arg: &Arg) -> Vec<String> {
    match arg {
        Arg::Scalar(v) => vec![text_of(v)],
        Arg::Many(items) => items.iter().map(text_of).collect(),
        _ => Vec::new(),
    }
}
