//! Typed values of the NSDK API.
//!
//! Scalars are mostly wrapped in an object naming their type:
//!
//! ```json
//! {"type": "string_", "string_": "Lounge Speakers"}
//! {"type": "i64_", "i64_": 86400}
//! ```
//!
//! Some paths return the bare scalar instead. Both decode into a
//! [`TypedValue`] so that call sites never inspect raw JSON; anything else
//! decodes to [`TypedValue::Unrecognized`].
//!
//! The player reports its Bluetooth device path as `{"string_": "..."}`
//! without a `type`. Only [`TypedValue::lenient`] accepts that form.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Kind tag of typed string values.
pub const KIND_STRING: &str = "string_";

/// A JSON scalar.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Converts a JSON value into a scalar, if it is one.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::String(s)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

/// A value as the NSDK API puts it on the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    /// `{"type": kind, kind: value}`
    Typed { kind: String, value: Scalar },
    /// A scalar without a type wrapper.
    Bare(Scalar),
    /// Any other shape.
    Unrecognized,
}

impl TypedValue {
    /// Wraps a string the way the API expects it on writes.
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::Typed {
            kind: KIND_STRING.to_owned(),
            value: Scalar::String(s.into()),
        }
    }

    /// Decodes `value`, also accepting an untyped `{"string_": ...}`.
    #[must_use]
    pub fn lenient(value: Value) -> Self {
        match value {
            Value::Object(mut map) if !map.contains_key("type") => {
                match map.remove(KIND_STRING) {
                    Some(Value::String(s)) => Self::string(s),
                    _ => Self::Unrecognized,
                }
            }
            other => other.into(),
        }
    }

    /// Deserializes like [`TypedValue::lenient`], for use with
    /// `#[serde(deserialize_with)]`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the input is not valid JSON.
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Self>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Value>::deserialize(deserializer).map(|value| value.map(Self::lenient))
    }

    /// The unwrapped scalar, regardless of its kind.
    #[must_use]
    pub fn into_scalar(self) -> Option<Scalar> {
        match self {
            Self::Typed { value, .. } | Self::Bare(value) => Some(value),
            Self::Unrecognized => None,
        }
    }

    /// The unwrapped value when it is a string, bare or of kind `string_`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Typed { kind, value } if kind == KIND_STRING => value.as_str(),
            Self::Bare(value) => value.as_str(),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::Typed { kind, value } if kind == KIND_STRING => value.into_string(),
            Self::Bare(value) => value.into_string(),
            _ => None,
        }
    }
}

impl From<Value> for TypedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                let Some(Value::String(kind)) = map.get("type") else {
                    return Self::Unrecognized;
                };
                let kind = kind.clone();

                match map.remove(&kind).and_then(Scalar::from_json) {
                    Some(value) => Self::Typed { kind, value },
                    None => Self::Unrecognized,
                }
            }
            other => Scalar::from_json(other).map_or(Self::Unrecognized, Self::Bare),
        }
    }
}

impl<'de> Deserialize<'de> for TypedValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Into::into)
    }
}

impl Serialize for TypedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        match self {
            Self::Typed { kind, value } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(kind, value)?;
                map.serialize_entry("type", kind)?;
                map.end()
            }
            Self::Bare(value) => value.serialize(serializer),
            Self::Unrecognized => serializer.serialize_none(),
        }
    }
}
