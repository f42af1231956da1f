//! Attribute items: the field-level record shape of the key-value store.
//!
//! Records are exchanged with the store as maps of field name to typed
//! value rather than as opaque blobs. This keeps partial updates honest:
//! a change-set names exactly the fields it touches, and decoding back
//! into typed records reports which field was missing or mistyped.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// A UTF-8 string value.
    Str(String),
    /// A 64-bit signed integer value.
    Int(i64),
    /// A boolean value.
    Bool(bool),
    /// A UTC timestamp value.
    Time(DateTime<Utc>),
}

impl Value {
    /// Returns the name of this value's type, for error reporting.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::Time(_) => "timestamp",
        }
    }

    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the timestamp value, if this is a timestamp.
    #[must_use]
    pub const fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Time(t)
    }
}

/// A stored record: an ordered map of field name to typed value.
pub type Item = BTreeMap<String, Value>;

/// Errors reported while decoding an [`Item`] into a typed record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A required attribute was absent from the item.
    #[error("missing attribute '{field}'")]
    MissingField {
        /// The absent field name.
        field: String,
    },

    /// An attribute was present but carried the wrong type.
    #[error("attribute '{field}' is not a {expected} (found {found})")]
    WrongType {
        /// The mistyped field name.
        field: String,
        /// The type the decoder expected.
        expected: &'static str,
        /// The type actually stored.
        found: &'static str,
    },
}

fn wrong_type(field: &str, expected: &'static str, value: &Value) -> DecodeError {
    DecodeError::WrongType {
        field: field.to_string(),
        expected,
        found: value.type_name(),
    }
}

/// Decodes a required string attribute.
///
/// # Errors
///
/// Returns [`DecodeError::MissingField`] if absent, or
/// [`DecodeError::WrongType`] if present with another type.
pub fn require_str<'a>(item: &'a Item, field: &str) -> Result<&'a str, DecodeError> {
    let value = item.get(field).ok_or_else(|| DecodeError::MissingField {
        field: field.to_string(),
    })?;
    value
        .as_str()
        .ok_or_else(|| wrong_type(field, "string", value))
}

/// Decodes an optional string attribute.
///
/// # Errors
///
/// Returns [`DecodeError::WrongType`] if present with another type.
pub fn optional_str<'a>(item: &'a Item, field: &str) -> Result<Option<&'a str>, DecodeError> {
    item.get(field)
        .map(|value| {
            value
                .as_str()
                .ok_or_else(|| wrong_type(field, "string", value))
        })
        .transpose()
}

/// Decodes an optional integer attribute.
///
/// # Errors
///
/// Returns [`DecodeError::WrongType`] if present with another type.
pub fn optional_int(item: &Item, field: &str) -> Result<Option<i64>, DecodeError> {
    item.get(field)
        .map(|value| {
            value
                .as_int()
                .ok_or_else(|| wrong_type(field, "integer", value))
        })
        .transpose()
}

/// Decodes an optional boolean attribute.
///
/// # Errors
///
/// Returns [`DecodeError::WrongType`] if present with another type.
pub fn optional_bool(item: &Item, field: &str) -> Result<Option<bool>, DecodeError> {
    item.get(field)
        .map(|value| {
            value
                .as_bool()
                .ok_or_else(|| wrong_type(field, "boolean", value))
        })
        .transpose()
}

/// Decodes an optional timestamp attribute.
///
/// # Errors
///
/// Returns [`DecodeError::WrongType`] if present with another type.
pub fn optional_time(item: &Item, field: &str) -> Result<Option<DateTime<Utc>>, DecodeError> {
    item.get(field)
        .map(|value| {
            value
                .as_time()
                .ok_or_else(|| wrong_type(field, "timestamp", value))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_item() -> Item {
        let mut item = Item::new();
        item.insert("name".into(), Value::from("worker"));
        item.insert("version".into(), Value::from(3_i64));
        item.insert("errored".into(), Value::from(false));
        item.insert(
            "createdAt".into(),
            Value::from(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
        );
        item
    }

    #[test]
    fn require_str_present() {
        let item = sample_item();
        assert_eq!(require_str(&item, "name").unwrap(), "worker");
    }

    #[test]
    fn require_str_missing() {
        let item = sample_item();
        let err = require_str(&item, "absent").unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingField {
                field: "absent".into()
            }
        );
    }

    #[test]
    fn require_str_wrong_type() {
        let item = sample_item();
        let err = require_str(&item, "version").unwrap_err();
        assert!(matches!(err, DecodeError::WrongType { expected: "string", .. }));
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn optional_attributes() {
        let item = sample_item();
        assert_eq!(optional_int(&item, "version").unwrap(), Some(3));
        assert_eq!(optional_int(&item, "absent").unwrap(), None);
        assert_eq!(optional_bool(&item, "errored").unwrap(), Some(false));
        assert!(optional_time(&item, "createdAt").unwrap().is_some());
        assert_eq!(optional_str(&item, "name").unwrap(), Some("worker"));
    }

    #[test]
    fn optional_wrong_type_is_an_error() {
        let item = sample_item();
        assert!(optional_int(&item, "name").is_err());
        assert!(optional_time(&item, "version").is_err());
    }

    #[test]
    fn value_type_names() {
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::from(1_i64).type_name(), "integer");
        assert_eq!(Value::from(true).type_name(), "boolean");
        assert_eq!(Value::from(Utc::now()).type_name(), "timestamp");
    }
}
