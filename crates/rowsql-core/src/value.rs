//! Column values and parameter handling.
//!
//! Rows read from the database carry values of whatever runtime type the
//! driver reports. They are modelled here as a tagged [`Value`] so that the
//! builder, the hasher and the cache can work with them uniformly.

use std::fmt;

use serde::Serialize;
use serde_json::Value as JsonValue;

/// A single column value, either read from a row or bound as a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Raw bytes, as some drivers report text columns.
    Bytes(Vec<u8>),
    /// Parsed JSON document.
    Json(JsonValue),
}

/// An ordered row of values in column declaration order.
pub type Row = Vec<Value>;

impl Value {
    /// Converts raw bytes into text.
    ///
    /// The same logical value may arrive as bytes or as a string depending on
    /// the driver, so rows are normalized once where they are ingested.
    #[must_use]
    pub fn normalize(self) -> Self {
        match self {
            Self::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Self::Text(text),
                Err(err) => Self::Text(String::from_utf8_lossy(err.as_bytes()).into_owned()),
            },
            other => other,
        }
    }

    /// Normalizes every value of a row.
    #[must_use]
    pub fn normalize_row(row: Row) -> Row {
        row.into_iter().map(Self::normalize).collect()
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an integer value.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Interprets the value as a flag.
    ///
    /// Information-schema queries report booleans as `BOOL` on PostgreSQL and
    /// as integers on MySQL and SQLite.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) => matches!(s.as_str(), "1" | "t" | "true" | "TRUE" | "YES"),
            _ => false,
        }
    }

    /// Converts the value into a JSON document.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(n) => JsonValue::from(*n),
            Self::Float(f) => JsonValue::from(*f),
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::Bytes(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
            Self::Json(j) => j.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Self::Json(j) => write!(f, "{j}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(String::from(s))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<JsonValue> for Value {
    fn from(j: JsonValue) -> Self {
        Self::Json(j)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
