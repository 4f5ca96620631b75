//! Field value types and typed conversions

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An insertion-ordered mapping from attribute name to value.
///
/// Used for identity mappings (`ids`), payload mappings (`kw`) and stored rows.
pub type Attributes = IndexMap<String, FieldValue>;

/// The composite-key part of an [`Attributes`] mapping
pub type Identity = Attributes;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<FixedOffset>),
    Null,
    /// Structured value objects (e.g. images)
    Json(serde_json::Value),
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Null, an empty string, or an empty JSON value
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::String(s) => s.is_empty(),
            FieldValue::Json(v) => v.is_null() || v.as_object().is_some_and(|o| o.is_empty()),
            _ => false,
        }
    }

    /// Short type name used in conversion errors
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::String(_) => "string",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Null => "null",
            FieldValue::Json(_) => "object",
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "'{}'", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::DateTime(dt) => write!(f, "'{}'", dt.to_rfc3339()),
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Json(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Build an [`Attributes`] mapping in insertion order
///
/// ```rust,ignore
/// let ids = attributes! { "id" => "1234", "provider_id" => "cloudplayer" };
/// ```
#[macro_export]
macro_rules! attributes {
    () => {
        $crate::core::field::Attributes::new()
    };
    ( $( $name:expr => $value:expr ),+ $(,)? ) => {{
        let mut map = $crate::core::field::Attributes::new();
        $( map.insert(::std::string::String::from($name), $crate::core::field::FieldValue::from($value)); )+
        map
    }};
}

/// Conversion between a typed struct field and a [`FieldValue`]
pub trait FieldType: Sized {
    fn to_field_value(&self) -> FieldValue;

    fn from_field_value(value: FieldValue) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &FieldValue) -> String {
    format!("expected {}, got {}", expected, value.kind())
}

impl FieldType for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }

    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FieldType for i64 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(*self)
    }

    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::Integer(i) => Ok(i),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FieldType for f64 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }

    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::Float(x) => Ok(x),
            FieldValue::Integer(i) => Ok(i as f64),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FieldType for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Boolean(*self)
    }

    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::Boolean(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FieldType for DateTime<FixedOffset> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::DateTime(*self)
    }

    // Untagged deserialization yields RFC 3339 strings for datetimes
    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::DateTime(dt) => Ok(dt),
            FieldValue::String(s) => DateTime::parse_from_rfc3339(&s).map_err(|e| e.to_string()),
            other => Err(mismatch("datetime", &other)),
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(value) => value.to_field_value(),
            None => FieldValue::Null,
        }
    }

    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        match value {
            FieldValue::Null => Ok(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

/// Encode a serde value object as [`FieldValue::Json`]
pub fn json_field_value<T: Serialize>(value: &T) -> FieldValue {
    serde_json::to_value(value).map_or(FieldValue::Null, FieldValue::Json)
}

/// Decode a serde value object from [`FieldValue::Json`]
pub fn from_json_field_value<T: DeserializeOwned>(value: FieldValue) -> Result<T, String> {
    match value {
        FieldValue::Json(v) => serde_json::from_value(v).map_err(|e| e.to_string()),
        other => Err(mismatch("object", &other)),
    }
}
