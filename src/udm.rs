//! # Universal Data Model
//!
//! The immutable, format-agnostic value tree every transformation reads and
//! writes. Codecs build [`Udm`] trees from XML, JSON, CSV, Avro and friends;
//! the evaluator only ever sees this representation.
//!
//! ## Invariants
//!
//! - Nodes are never mutated once shared. Building a new node consumes the
//!   old one (`with_*` builders) or clones what it needs.
//! - Object property order is insertion order, end to end.
//! - Equality is structural and type sensitive: `Integer(1) == Float(1.0)`
//!   (both are numbers) but `Integer(1) != String("1")`.
//! - Object attributes, metadata and element names never take part in
//!   equality or operators.
//!
//! ## Example
//!
//! ```
//! use utlx_core::udm::{Object, Udm};
//!
//! let order = Udm::Object(
//!     Object::named("Order")
//!         .with_attribute("id", "42")
//!         .with_property("total", Udm::Integer(10)),
//! );
//! assert_eq!(order.type_name(), "object");
//! ```

mod object;
mod ordered_map;
mod path;

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::evaluator::Closure;

pub use object::Object;
pub use ordered_map::OrderedMap;
pub use path::{Navigation, PathSegment};

/// A UDM node.
#[derive(Debug, Clone)]
pub enum Udm {
    Null,
    Boolean(bool),
    /// Number kind, integral representation
    Integer(i64),
    /// Number kind, floating representation
    Float(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Binary(Binary),
    Array(Vec<Udm>),
    Object(Object),
    /// A closure created by a lambda expression
    Lambda(Arc<Closure>),
}

/// Raw bytes plus the text encoding used when they must become a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub bytes: Vec<u8>,
    pub encoding: BinaryEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryEncoding {
    #[default]
    Base64,
    Hex,
}

impl Binary {
    pub fn encode(&self) -> String {
        match self.encoding {
            BinaryEncoding::Base64 => STANDARD.encode(&self.bytes),
            BinaryEncoding::Hex => hex::encode(&self.bytes),
        }
    }
}

/// A scalar could not be coerced to the kind an operation needs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot use {found} as {expected}")]
pub struct CoercionError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl Udm {
    /// Human-readable kind name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Udm::Null => "null",
            Udm::Boolean(_) => "boolean",
            Udm::Integer(_) | Udm::Float(_) => "number",
            Udm::String(_) => "string",
            Udm::DateTime(_) => "datetime",
            Udm::Date(_) => "date",
            Udm::Time(_) => "time",
            Udm::Binary(_) => "binary",
            Udm::Array(_) => "array",
            Udm::Object(_) => "object",
            Udm::Lambda(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Udm::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Udm::Integer(_) | Udm::Float(_))
    }

    fn mismatch(&self, expected: &'static str) -> CoercionError {
        CoercionError {
            expected,
            found: self.type_name(),
        }
    }

    /// String form of a scalar. Null, arrays, objects and functions fail.
    pub fn as_string(&self) -> Result<String, CoercionError> {
        match self {
            Udm::String(s) => Ok(s.clone()),
            Udm::Integer(n) => Ok(n.to_string()),
            Udm::Float(n) => Ok(n.to_string()),
            Udm::Boolean(b) => Ok(b.to_string()),
            Udm::DateTime(dt) => Ok(dt.to_rfc3339()),
            Udm::Date(d) => Ok(d.format("%Y-%m-%d").to_string()),
            Udm::Time(t) => Ok(t.format("%H:%M:%S%.f").to_string()),
            Udm::Binary(b) => Ok(b.encode()),
            _ => Err(self.mismatch("string")),
        }
    }

    /// Numbers only; strings are not parsed implicitly.
    pub fn as_number(&self) -> Result<f64, CoercionError> {
        match self {
            Udm::Integer(n) => Ok(*n as f64),
            Udm::Float(n) => Ok(*n),
            _ => Err(self.mismatch("number")),
        }
    }

    /// Booleans, with null read as false.
    pub fn as_boolean(&self) -> Result<bool, CoercionError> {
        match self {
            Udm::Boolean(b) => Ok(*b),
            Udm::Null => Ok(false),
            _ => Err(self.mismatch("boolean")),
        }
    }

    pub fn as_array(&self) -> Option<&[Udm]> {
        match self {
            Udm::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Udm::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl PartialEq for Udm {
    fn eq(&self, other: &Self) -> bool {
        use Udm::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Integer(a), Float(b)) | (Float(b), Integer(a)) => (*a as f64) == *b,
            (String(a), String(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (Binary(a), Binary(b)) => a.bytes == b.bytes,
            (Array(a), Array(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            (Lambda(a), Lambda(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Udm {
    fn from(b: bool) -> Self {
        Udm::Boolean(b)
    }
}

impl From<i64> for Udm {
    fn from(n: i64) -> Self {
        Udm::Integer(n)
    }
}

impl From<f64> for Udm {
    fn from(n: f64) -> Self {
        Udm::Float(n)
    }
}

impl From<&str> for Udm {
    fn from(s: &str) -> Self {
        Udm::String(s.to_string())
    }
}

impl From<String> for Udm {
    fn from(s: String) -> Self {
        Udm::String(s)
    }
}

impl From<Vec<Udm>> for Udm {
    fn from(items: Vec<Udm>) -> Self {
        Udm::Array(items)
    }
}

impl From<Object> for Udm {
    fn from(object: Object) -> Self {
        Udm::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Udm {
        Udm::Object(
            Object::named("Order")
                .with_attribute("id", "A-1")
                .with_property("customer", Udm::Null)
                .with_property(
                    "lines",
                    Udm::Array(vec![
                        Udm::Object(Object::new().with_property("qty", Udm::Integer(2))),
                        Udm::Object(Object::new().with_property("qty", Udm::Integer(5))),
                    ]),
                ),
        )
    }

    #[test]
    fn equality_is_type_sensitive() {
        assert_eq!(Udm::Integer(1), Udm::Float(1.0));
        assert_ne!(Udm::Integer(1), Udm::String("1".into()));
        assert_ne!(Udm::Null, Udm::Boolean(false));
    }

    #[test]
    fn equality_ignores_attributes_and_order() {
        let a = Udm::Object(
            Object::new()
                .with_attribute("x", "1")
                .with_property("a", Udm::Integer(1))
                .with_property("b", Udm::Integer(2)),
        );
        let b = Udm::Object(
            Object::named("other")
                .with_property("b", Udm::Integer(2))
                .with_property("a", Udm::Integer(1)),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn navigation_distinguishes_null_from_missing() {
        let order = sample();
        let customer = [PathSegment::Property("customer".into())];
        let absent = [PathSegment::Property("supplier".into())];
        assert_eq!(order.get(&customer), Navigation::Found(&Udm::Null));
        assert_eq!(order.get(&absent), Navigation::Missing { depth: 0 });
    }

    #[test]
    fn navigation_through_arrays_and_attributes() {
        let order = sample();
        let last_qty = [
            PathSegment::Property("lines".into()),
            PathSegment::Index(-1),
            PathSegment::Property("qty".into()),
        ];
        assert_eq!(order.get(&last_qty), Navigation::Found(&Udm::Integer(5)));
        assert_eq!(
            order.get(&[PathSegment::Attribute("id".into())]),
            Navigation::Attribute("A-1")
        );
        let through_null = [
            PathSegment::Property("customer".into()),
            PathSegment::Property("name".into()),
        ];
        assert_eq!(order.get(&through_null), Navigation::Missing { depth: 1 });
    }

    #[test]
    fn coercions_fail_explicitly() {
        assert_eq!(Udm::Float(2.5).as_string().unwrap(), "2.5");
        assert_eq!(Udm::Integer(3).as_number().unwrap(), 3.0);
        assert!(Udm::String("3".into()).as_number().is_err());
        assert_eq!(Udm::Null.as_boolean(), Ok(false));
        let err = Udm::Array(vec![]).as_string().unwrap_err();
        assert_eq!(err.to_string(), "cannot use array as string");
    }

    #[test]
    fn binary_renders_with_its_encoding() {
        let hexed = Binary {
            bytes: vec![0xde, 0xad],
            encoding: BinaryEncoding::Hex,
        };
        assert_eq!(Udm::Binary(hexed).as_string().unwrap(), "dead");
        let b64 = Binary {
            bytes: b"hi".to_vec(),
            encoding: BinaryEncoding::Base64,
        };
        assert_eq!(Udm::Binary(b64).as_string().unwrap(), "aGk=");
    }
}
