//! Dynamically typed SQL values used by records and criteria.

use std::cmp::Ordering;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::result::AppResult;

/// A dynamic value that can represent the SQL types crudbase binds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// A timestamp value.
    Timestamp(DateTime<Utc>),
    /// A UUID value.
    Uuid(Uuid),
    /// A string value.
    Text(String),
    /// A list of values (for `IN` / `BETWEEN` operands).
    List(Vec<Value>),
    /// A binary value.
    Bytes(Vec<u8>),
}

impl Value {
    /// Whether this is SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value cannot serve as a filter operand: null, a blank
    /// string, an empty list or a zero-length byte array.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Bytes(bytes) => bytes.is_empty(),
            _ => false,
        }
    }

    /// A timestamp truncated to millisecond precision.
    pub fn timestamp_millis(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts.trunc_subsecs(3))
    }

    /// Compare two values the way a SQL comparison would.
    ///
    /// Returns `None` when either side is `NULL` or the types are not
    /// comparable. Integers and floats compare numerically.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => None,
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            (Self::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bytes(a), Self::Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// SQL equality: `NULL` never equals anything.
    pub fn sql_eq(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Timestamp(_) => "timestamp",
            Self::Uuid(_) => "uuid",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Bytes(_) => "bytes",
        }
    }

    pub fn into_bool(self) -> AppResult<Option<bool>> {
        match self {
            Self::Null => Ok(None),
            Self::Bool(b) => Ok(Some(b)),
            other => Err(mismatch("bool", &other)),
        }
    }

    pub fn into_i64(self) -> AppResult<Option<i64>> {
        match self {
            Self::Null => Ok(None),
            Self::Int(i) => Ok(Some(i)),
            other => Err(mismatch("int", &other)),
        }
    }

    pub fn into_f64(self) -> AppResult<Option<f64>> {
        match self {
            Self::Null => Ok(None),
            Self::Float(f) => Ok(Some(f)),
            Self::Int(i) => Ok(Some(i as f64)),
            other => Err(mismatch("float", &other)),
        }
    }

    pub fn into_string(self) -> AppResult<Option<String>> {
        match self {
            Self::Null => Ok(None),
            Self::Text(s) => Ok(Some(s)),
            other => Err(mismatch("text", &other)),
        }
    }

    pub fn into_timestamp(self) -> AppResult<Option<DateTime<Utc>>> {
        match self {
            Self::Null => Ok(None),
            Self::Timestamp(ts) => Ok(Some(ts)),
            other => Err(mismatch("timestamp", &other)),
        }
    }

    pub fn into_uuid(self) -> AppResult<Option<Uuid>> {
        match self {
            Self::Null => Ok(None),
            Self::Uuid(id) => Ok(Some(id)),
            Self::Text(s) => Uuid::parse_str(&s)
                .map(Some)
                .map_err(|e| AppError::validation(format!("Invalid uuid '{s}': {e}"))),
            other => Err(mismatch("uuid", &other)),
        }
    }

    pub fn into_bytes(self) -> AppResult<Option<Vec<u8>>> {
        match self {
            Self::Null => Ok(None),
            Self::Bytes(b) => Ok(Some(b)),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

fn mismatch(expected: &str, actual: &Value) -> AppError {
    AppError::validation(format!(
        "Expected a {expected} value, found {}",
        actual.type_name()
    ))
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Self::List(v.into_iter().map(Value::Int).collect())
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Self::List(v.into_iter().map(Value::Text).collect())
    }
}

impl From<Vec<Uuid>> for Value {
    fn from(v: Vec<Uuid>) -> Self {
        Self::List(v.into_iter().map(Value::Uuid).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
