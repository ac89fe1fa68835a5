//! Decoding of PostgreSQL rows into records.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crudbase_core::error::{AppError, ErrorKind};
use crudbase_core::result::AppResult;
use crudbase_core::types::{Record, Value};
use crudbase_entity::{ColumnDef, ColumnType, EntityMeta};

/// Read every declared column of `meta` from a row.
pub fn decode(meta: &EntityMeta, row: &PgRow) -> AppResult<Record> {
    let mut record = Record::new();
    for column in meta.columns() {
        record.set(column.name, decode_column(column, row)?);
    }
    Ok(record)
}

fn decode_column(column: &ColumnDef, row: &PgRow) -> AppResult<Value> {
    let name = column.name;
    let value = match column.kind {
        ColumnType::Bool => row.try_get::<Option<bool>, _>(name).map(Value::from),
        ColumnType::Int => row.try_get::<Option<i32>, _>(name).map(Value::from),
        ColumnType::BigInt => row.try_get::<Option<i64>, _>(name).map(Value::from),
        ColumnType::Double => row.try_get::<Option<f64>, _>(name).map(Value::from),
        ColumnType::Text => row.try_get::<Option<String>, _>(name).map(Value::from),
        ColumnType::Timestamp => row
            .try_get::<Option<DateTime<Utc>>, _>(name)
            .map(Value::from),
        ColumnType::Uuid => row.try_get::<Option<Uuid>, _>(name).map(Value::from),
        ColumnType::Bytes => row.try_get::<Option<Vec<u8>>, _>(name).map(Value::from),
    };
    value.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to decode column '{name}'"),
            e,
        )
    })
}
