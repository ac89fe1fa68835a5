//! Static table metadata declared by each entity type.

use crudbase_core::error::AppError;
use crudbase_core::messages;
use crudbase_core::result::AppResult;
use crudbase_core::types::{Example, Value};

use crate::base::BASE_COLUMNS;

/// SQL type of a column, used to bind parameters and decode rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    /// 32-bit integer (`INTEGER`).
    Int,
    /// 64-bit integer (`BIGINT`).
    BigInt,
    Double,
    Text,
    /// `TIMESTAMPTZ`.
    Timestamp,
    Uuid,
    Bytes,
}

/// One column of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnType,
    pub primary_key: bool,
}

impl ColumnDef {
    /// A regular column.
    pub const fn new(name: &'static str, kind: ColumnType) -> Self {
        Self {
            name,
            kind,
            primary_key: false,
        }
    }

    /// A primary key column.
    pub const fn key(name: &'static str, kind: ColumnType) -> Self {
        Self {
            name,
            kind,
            primary_key: true,
        }
    }
}

/// Table name and columns of an entity type.
///
/// `columns` lists the entity's own columns; the shared audit columns of
/// [`BASE_COLUMNS`] are appended implicitly.
#[derive(Debug)]
pub struct EntityMeta {
    pub table: &'static str,
    columns: &'static [ColumnDef],
}

impl EntityMeta {
    pub const fn new(table: &'static str, columns: &'static [ColumnDef]) -> Self {
        Self { table, columns }
    }

    /// Every column, own columns first.
    pub fn columns(&self) -> impl Iterator<Item = &'static ColumnDef> {
        let own: &'static [ColumnDef] = self.columns;
        own.iter().chain(BASE_COLUMNS.iter())
    }

    /// Look up a declared column.
    pub fn column(&self, name: &str) -> AppResult<&'static ColumnDef> {
        self.columns().find(|c| c.name == name).ok_or_else(|| {
            AppError::validation(format!(
                "Unknown column '{name}' on table '{}'",
                self.table
            ))
        })
    }

    /// Primary key columns in declaration order.
    pub fn primary_keys(&self) -> Vec<&'static ColumnDef> {
        self.columns().filter(|c| c.primary_key).collect()
    }

    /// The primary key column of a single-key table.
    pub fn single_primary_key(&self) -> AppResult<&'static ColumnDef> {
        match self.primary_keys().as_slice() {
            [key] => Ok(*key),
            _ => Err(AppError::configuration(messages::PRIMARY_KEY_NOT_SINGLE)),
        }
    }

    /// An example addressing one row by key.
    ///
    /// Composite keys take a [`Value::List`] in declaration order.
    pub fn key_example(&self, id: &Value) -> AppResult<Example> {
        let keys = self.primary_keys();
        if keys.is_empty() {
            return Err(AppError::configuration(messages::PRIMARY_KEY_NOT_DECLARED));
        }
        let parts: Vec<&Value> = match (keys.len(), id) {
            (1, id) => vec![id],
            (n, Value::List(items)) if items.len() == n => items.iter().collect(),
            (n, _) => {
                return Err(AppError::validation(format!(
                    "Table '{}' has a {n}-column primary key",
                    self.table
                )));
            }
        };

        let mut example = Example::new();
        let group = example.create_criteria();
        for (key, value) in keys.iter().zip(parts) {
            if value.is_missing() {
                return Err(AppError::validation(messages::PRIMARY_KEY_VALUE_MISSING));
            }
            group.and_equal_to(key.name, value.clone());
        }
        Ok(example)
    }

    /// Reject examples that reference undeclared columns.
    pub fn check_example(&self, example: &Example) -> AppResult<()> {
        for column in example.columns() {
            self.column(column)?;
        }
        Ok(())
    }
}
