//! Field values and the conversions between their wire text and typed form.
//!
//! Well-known entity fields are typed struct members; everything an
//! application attaches beyond them is an extension [`Value`]. Auxiliary
//! value objects implement [`Bean`] so the codec can walk their properties
//! without any runtime reflection.

use crate::error::FieldError;
use crate::{CompletionStatus, EntityId, Timestamp};
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// An extension value attached to an entity.
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<Value>),
    Bean(Arc<dyn Bean>),
}

impl Value {
    /// Returns the text if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is an `Array` value.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the bean if this is a `Bean` value.
    pub fn as_bean(&self) -> Option<&(dyn Bean + 'static)> {
        match self {
            Value::Bean(b) => Some(b.as_ref()),
            _ => None,
        }
    }

    /// Returns true for scalar (non-array, non-bean) values.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Bean(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Bean(b) => write!(f, "{b}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Bean(a), Value::Bean(b)) => {
                a.bean_type() == b.bean_type() && a.properties() == b.properties()
            }
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Value::Integer(n),
            Err(_) => Value::Text(n.to_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Arc<dyn Bean>> for Value {
    fn from(bean: Arc<dyn Bean>) -> Self {
        Value::Bean(bean)
    }
}

/// A plain auxiliary value object that can travel inside extension fields.
///
/// Implementors enumerate their own properties for encoding and accept
/// them back one at a time during decoding. A bean only round-trips as a
/// structured object when its type is registered with the type registry;
/// otherwise it is written using its `Display` form.
pub trait Bean: fmt::Debug + fmt::Display + Send + Sync + Any {
    /// Simple type name, written as the wire type tag.
    fn bean_type(&self) -> &'static str;

    /// Properties to encode, in a stable order.
    fn properties(&self) -> Vec<(String, Value)>;

    /// Sets one decoded property.
    ///
    /// Return [`FieldError::Missing`] for names the bean does not know.
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), FieldError>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn Bean {
    /// Downcasts to a concrete bean type.
    pub fn downcast_ref<T: Bean>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Conversion from a decoded wire value into a typed field.
///
/// Textual fields take the text as-is, primitive fields parse it, and
/// enum-like or domain types supply their own string conversion.
pub trait FromWire: Sized {
    fn from_wire(field: &str, value: Value) -> Result<Self, FieldError>;
}

fn parse_text<T>(field: &str, value: Value) -> Result<T, FieldError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if !value.is_scalar() {
        return Err(FieldError::invalid(field, "expected a scalar"));
    }
    let text = value.to_string();
    text.trim()
        .parse::<T>()
        .map_err(|e| FieldError::invalid(field, format!("{text:?}: {e}")))
}

impl FromWire for String {
    fn from_wire(field: &str, value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Array(_) | Value::Bean(_) => {
                Err(FieldError::invalid(field, "expected a scalar"))
            }
            scalar => Ok(scalar.to_string()),
        }
    }
}

impl FromWire for i64 {
    fn from_wire(field: &str, value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Integer(n) => Ok(n),
            other => parse_text(field, other),
        }
    }
}

impl FromWire for u64 {
    fn from_wire(field: &str, value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Integer(n) => {
                u64::try_from(n).map_err(|_| FieldError::invalid(field, "negative value"))
            }
            other => parse_text(field, other),
        }
    }
}

impl FromWire for f64 {
    fn from_wire(field: &str, value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Integer(n) => Ok(n as f64),
            other => parse_text(field, other),
        }
    }
}

impl FromWire for bool {
    fn from_wire(field: &str, value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => parse_text(field, other),
        }
    }
}

impl FromWire for CompletionStatus {
    fn from_wire(field: &str, value: Value) -> Result<Self, FieldError> {
        parse_text(field, value)
    }
}

impl FromWire for EntityId {
    fn from_wire(field: &str, value: Value) -> Result<Self, FieldError> {
        parse_text(field, value)
    }
}

impl FromWire for Timestamp {
    fn from_wire(field: &str, value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Integer(n) => u64::try_from(n)
                .map(Timestamp::from_millis)
                .map_err(|_| FieldError::invalid(field, "negative timestamp")),
            other => parse_text(field, other),
        }
    }
}

impl FromWire for Vec<Value> {
    /// A scalar becomes a one-element list.
    fn from_wire(_field: &str, value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Array(items) => Ok(items),
            single => Ok(vec![single]),
        }
    }
}
