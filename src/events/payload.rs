//! # Event payloads.
//!
//! [`Payload`] is a tagged union: the variant is the discriminator, so consumers
//! match on it instead of guessing at an opaque value. Application-defined types
//! travel in [`Payload::Shared`] and are read back with [`Payload::downcast_ref`].
//!
//! Every variant is cheap to clone (`Arc`-backed or `Copy`), which matters because
//! one payload is shared by every subscriber that receives the event.
//!
//! ## Example
//! ```rust
//! use streambus::Payload;
//!
//! #[derive(Debug, PartialEq)]
//! struct Reading { celsius: f32 }
//!
//! let n = Payload::from(42);
//! assert_eq!(n.as_int(), Some(42));
//! assert_eq!(n.kind(), "int");
//!
//! let custom = Payload::shared(Reading { celsius: 21.5 });
//! assert_eq!(custom.downcast_ref::<Reading>(), Some(&Reading { celsius: 21.5 }));
//! assert_eq!(custom.downcast_ref::<String>(), None);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Typed payload attached to an [`Event`](crate::Event).
#[derive(Clone)]
pub enum Payload {
    /// UTF-8 text.
    Text(Arc<str>),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Raw bytes.
    Bytes(Arc<[u8]>),
    /// Application-defined value; compared by identity.
    Shared(Arc<dyn Any + Send + Sync>),
}

impl Payload {
    /// Wraps an application-defined value.
    pub fn shared<T: Any + Send + Sync>(value: T) -> Self {
        Payload::Shared(Arc::new(value))
    }

    /// Returns the variant name (`"text"`, `"int"`, `"float"`, `"bool"`, `"bytes"`, `"shared"`).
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Int(_) => "int",
            Payload::Float(_) => "float",
            Payload::Bool(_) => "bool",
            Payload::Bytes(_) => "bytes",
            Payload::Shared(_) => "shared",
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Payload::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Payload::Float(x) => Some(*x),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the shared value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Payload::Shared(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Text(a), Payload::Text(b)) => a == b,
            (Payload::Int(a), Payload::Int(b)) => a == b,
            (Payload::Float(a), Payload::Float(b)) => a == b,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::Bytes(a), Payload::Bytes(b)) => a == b,
            (Payload::Shared(a), Payload::Shared(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Payload::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Payload::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Payload::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Payload::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Payload::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(Arc::from(s))
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(Arc::from(s))
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Payload::Int(n)
    }
}

impl From<i32> for Payload {
    fn from(n: i32) -> Self {
        Payload::Int(i64::from(n))
    }
}

impl From<f64> for Payload {
    fn from(x: f64) -> Self {
        Payload::Float(x)
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Bool(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(Arc::from(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_match_variant_only() {
        let p = Payload::from("hello");
        assert_eq!(p.as_text(), Some("hello"));
        assert_eq!(p.as_int(), None);
        assert_eq!(p.as_bool(), None);

        let b = Payload::from(vec![1u8, 2, 3]);
        assert_eq!(b.as_bytes(), Some(&[1u8, 2, 3][..]));
        assert_eq!(b.kind(), "bytes");
    }

    #[test]
    fn test_shared_compares_by_identity() {
        let a = Payload::shared(7u32);
        let same = a.clone();
        let other = Payload::shared(7u32);

        assert_eq!(a, same);
        assert_ne!(a, other);
        assert_eq!(a.downcast_ref::<u32>(), Some(&7));
    }

    #[test]
    fn test_different_variants_are_not_equal() {
        assert_ne!(Payload::from(1), Payload::from(1.0));
        assert_ne!(Payload::from(true), Payload::from("true"));
    }
}
