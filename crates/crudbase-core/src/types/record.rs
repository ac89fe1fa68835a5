//! Column-name to value maps exchanged between entities and stores.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::result::AppResult;
use crate::types::value::Value;

/// A single row as a map of column name to [`Value`].
///
/// Absent columns read as [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<&'static str, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column value, replacing any previous one.
    pub fn set(&mut self, column: &'static str, value: impl Into<Value>) {
        self.values.insert(column, value.into());
    }

    /// Borrow a column value; absent columns read as `NULL`.
    pub fn get(&self, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.values.get(column).unwrap_or(&NULL)
    }

    /// Remove and return a column value.
    pub fn take(&mut self, column: &str) -> Value {
        self.values.remove(column).unwrap_or(Value::Null)
    }

    /// Iterate over the columns that hold a value.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Overwrite this record's columns with every column of `other`.
    pub fn merge(&mut self, other: &Record) {
        for (column, value) in other.iter() {
            self.values.insert(column, value.clone());
        }
    }

    pub fn take_bool(&mut self, column: &str) -> AppResult<Option<bool>> {
        self.take(column).into_bool().map_err(|e| column_error(column, e))
    }

    pub fn take_i64(&mut self, column: &str) -> AppResult<Option<i64>> {
        self.take(column).into_i64().map_err(|e| column_error(column, e))
    }

    pub fn take_f64(&mut self, column: &str) -> AppResult<Option<f64>> {
        self.take(column).into_f64().map_err(|e| column_error(column, e))
    }

    pub fn take_string(&mut self, column: &str) -> AppResult<Option<String>> {
        self.take(column).into_string().map_err(|e| column_error(column, e))
    }

    pub fn take_timestamp(&mut self, column: &str) -> AppResult<Option<DateTime<Utc>>> {
        self.take(column)
            .into_timestamp()
            .map_err(|e| column_error(column, e))
    }

    pub fn take_uuid(&mut self, column: &str) -> AppResult<Option<Uuid>> {
        self.take(column).into_uuid().map_err(|e| column_error(column, e))
    }

    pub fn take_bytes(&mut self, column: &str) -> AppResult<Option<Vec<u8>>> {
        self.take(column).into_bytes().map_err(|e| column_error(column, e))
    }
}

fn column_error(column: &str, err: AppError) -> AppError {
    AppError::new(err.kind, format!("Column '{column}': {}", err.message))
}
