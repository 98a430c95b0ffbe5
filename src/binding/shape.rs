//! Structural type descriptors.
//!
//! A [`TypeShape`] is the declared type of a parameter or return value,
//! including all type arguments. It stands in for reflective generic
//! inspection: async-handle detection, payload unwrapping and the canonical
//! signature used to key response adapters.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Declared shape of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    Unit,
    Bool,
    Integer,
    Float,
    String,
    /// Untyped JSON document.
    Json,
    /// A user type, identified by name.
    Named(String),
    Optional(Box<TypeShape>),
    List(Box<TypeShape>),
    Map(Box<TypeShape>, Box<TypeShape>),
    /// An async handle resolving to the inner shape.
    Pending(Box<TypeShape>),
}

impl TypeShape {
    pub fn named(name: impl Into<String>) -> Self {
        TypeShape::Named(name.into())
    }

    pub fn optional(inner: TypeShape) -> Self {
        TypeShape::Optional(Box::new(inner))
    }

    pub fn list(inner: TypeShape) -> Self {
        TypeShape::List(Box::new(inner))
    }

    pub fn map(key: TypeShape, value: TypeShape) -> Self {
        TypeShape::Map(Box::new(key), Box::new(value))
    }

    pub fn pending(inner: TypeShape) -> Self {
        TypeShape::Pending(Box::new(inner))
    }

    /// True for async-handle shapes.
    pub fn is_async_handle(&self) -> bool {
        matches!(self, TypeShape::Pending(_))
    }

    /// The payload shape: the type argument of an async handle, else `self`.
    pub fn unwrapped(&self) -> &TypeShape {
        match self {
            TypeShape::Pending(inner) => inner,
            other => other,
        }
    }

    /// True when the shape carries type arguments.
    pub fn is_parameterized(&self) -> bool {
        matches!(
            self,
            TypeShape::Optional(_) | TypeShape::List(_) | TypeShape::Map(..) | TypeShape::Pending(_)
        )
    }

    /// Whether an empty response body is a valid encoding of this shape.
    pub fn accepts_empty(&self) -> bool {
        matches!(self, TypeShape::Unit | TypeShape::Optional(_) | TypeShape::Json)
    }

    /// Canonical signature, e.g. `map-of-string-to-order`.
    pub fn signature(&self) -> String {
        match self {
            TypeShape::Unit => "unit".to_string(),
            TypeShape::Bool => "bool".to_string(),
            TypeShape::Integer => "integer".to_string(),
            TypeShape::Float => "float".to_string(),
            TypeShape::String => "string".to_string(),
            TypeShape::Json => "json".to_string(),
            TypeShape::Named(name) => name.clone(),
            TypeShape::Optional(inner) => format!("optional-of-{}", inner.signature()),
            TypeShape::List(inner) => format!("list-of-{}", inner.signature()),
            TypeShape::Map(k, v) => format!("map-of-{}-to-{}", k.signature(), v.signature()),
            TypeShape::Pending(inner) => format!("pending-of-{}", inner.signature()),
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Types that can report their declared shape.
pub trait Describe {
    fn shape() -> TypeShape;
}

/// Implement [`Describe`] for a user type under a stable name.
///
/// ```ignore
/// describe_named!(Order, "order");
/// ```
#[macro_export]
macro_rules! describe_named {
    ($ty:ty, $name:expr) => {
        impl $crate::binding::shape::Describe for $ty {
            fn shape() -> $crate::binding::shape::TypeShape {
                $crate::binding::shape::TypeShape::Named(::std::string::String::from($name))
            }
        }
    };
}

macro_rules! describe_as {
    ($shape:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn shape() -> TypeShape {
                    $shape
                }
            }
        )+
    };
}

describe_as!(TypeShape::Unit => ());
describe_as!(TypeShape::Bool => bool);
describe_as!(TypeShape::Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
describe_as!(TypeShape::Float => f32, f64);
describe_as!(TypeShape::String => String, str, char);
describe_as!(TypeShape::Json => serde_json::Value);

impl<T: Describe + ?Sized> Describe for &T {
    fn shape() -> TypeShape {
        T::shape()
    }
}

impl<T: Describe> Describe for Option<T> {
    fn shape() -> TypeShape {
        TypeShape::optional(T::shape())
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::list(T::shape())
    }
}

impl<T: Describe> Describe for [T] {
    fn shape() -> TypeShape {
        TypeShape::list(T::shape())
    }
}

impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn shape() -> TypeShape {
        TypeShape::map(K::shape(), V::shape())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn shape() -> TypeShape {
        TypeShape::map(K::shape(), V::shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order;
    describe_named!(Order, "order");

    #[test]
    fn test_signatures() {
        assert_eq!(<Vec<String>>::shape().signature(), "list-of-string");
        assert_eq!(
            <HashMap<String, Order>>::shape().signature(),
            "map-of-string-to-order"
        );
        assert_eq!(<Option<u64>>::shape().signature(), "optional-of-integer");
        assert_eq!(<&str>::shape(), TypeShape::String);
    }

    #[test]
    fn test_unwrap_async_handle() {
        let declared = TypeShape::pending(<Vec<Order>>::shape());
        assert!(declared.is_async_handle());
        assert_eq!(declared.unwrapped(), &TypeShape::list(TypeShape::named("order")));

        let plain = Order::shape();
        assert!(!plain.is_async_handle());
        assert_eq!(plain.unwrapped(), &plain);
    }

    #[test]
    fn test_parameterized() {
        assert!(<Vec<u8>>::shape().is_parameterized());
        assert!(!String::shape().is_parameterized());
        assert!(<()>::shape().accepts_empty());
        assert!(!Order::shape().accepts_empty());
    }
}
