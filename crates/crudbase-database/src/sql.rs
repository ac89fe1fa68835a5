//! Rendering of entity statements to parameterized PostgreSQL.
//!
//! Column names come from [`EntityMeta`] and are checked against it before
//! they reach the SQL text; every value is bound as a parameter typed after
//! its declared column. `NULL` is written as a literal.

use sqlx::{Postgres, QueryBuilder};

use crudbase_core::error::AppError;
use crudbase_core::messages;
use crudbase_core::result::AppResult;
use crudbase_core::types::{
    Condition, Criterion, DEL_FLAG_COLUMN, DeleteFlag, Example, PageWindow, Record, Value,
};
use crudbase_entity::{ColumnDef, ColumnType, EntityMeta};

/// A statement under construction.
pub type PgQuery = QueryBuilder<'static, Postgres>;

/// PostgreSQL accepts at most this many bind parameters per statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// `SELECT <columns> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT .. OFFSET ..]`
pub fn select(meta: &EntityMeta, example: &Example, window: Option<PageWindow>) -> AppResult<PgQuery> {
    let mut query = PgQuery::new("SELECT ");
    query.push(column_list(meta)).push(" FROM ").push(meta.table);
    push_where(&mut query, meta, example)?;
    push_order_by(&mut query, meta, example)?;
    if let Some(window) = window {
        query
            .push(" LIMIT ")
            .push_bind(to_i64(window.limit()))
            .push(" OFFSET ")
            .push_bind(to_i64(window.offset()));
    }
    Ok(query)
}

/// `SELECT COUNT(*) FROM <table> [WHERE ..]`
pub fn count(meta: &EntityMeta, example: &Example) -> AppResult<PgQuery> {
    let mut query = PgQuery::new("SELECT COUNT(*) FROM ");
    query.push(meta.table);
    push_where(&mut query, meta, example)?;
    Ok(query)
}

/// `UPDATE <table> SET .. [WHERE ..]`
///
/// Key columns are never written. `selective` skips null columns and fails
/// when nothing is left to write.
pub fn update(
    meta: &EntityMeta,
    record: &Record,
    example: &Example,
    selective: bool,
) -> AppResult<PgQuery> {
    let columns: Vec<&ColumnDef> = meta
        .columns()
        .filter(|c| !c.primary_key)
        .filter(|c| !selective || !record.get(c.name).is_null())
        .collect();
    if columns.is_empty() {
        return Err(AppError::validation(messages::NOTHING_TO_UPDATE));
    }

    let mut query = PgQuery::new("UPDATE ");
    query.push(meta.table).push(" SET ");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            query.push(", ");
        }
        query.push(column.name).push(" = ");
        push_value(&mut query, column, record.get(column.name))?;
    }
    push_where(&mut query, meta, example)?;
    Ok(query)
}

/// `DELETE FROM <table> [WHERE ..]`
pub fn delete(meta: &EntityMeta, example: &Example) -> AppResult<PgQuery> {
    let mut query = PgQuery::new("DELETE FROM ");
    query.push(meta.table);
    push_where(&mut query, meta, example)?;
    Ok(query)
}

/// `INSERT INTO <table> (..) VALUES (..)` for one row.
///
/// Null key columns are left out so the database default applies;
/// `selective` leaves out every null column.
pub fn insert(meta: &EntityMeta, record: &Record, selective: bool) -> AppResult<PgQuery> {
    let columns: Vec<&ColumnDef> = meta
        .columns()
        .filter(|c| !(record.get(c.name).is_null() && (selective || c.primary_key)))
        .collect();

    let mut query = PgQuery::new("INSERT INTO ");
    query.push(meta.table);
    if columns.is_empty() {
        query.push(" DEFAULT VALUES");
        return Ok(query);
    }

    query.push(" (");
    push_names(&mut query, &columns);
    query.push(") VALUES (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            query.push(", ");
        }
        push_value(&mut query, column, record.get(column.name))?;
    }
    query.push(")");
    Ok(query)
}

/// A multi-row `INSERT` writing every column. Null keys become `DEFAULT`.
pub fn insert_many(meta: &EntityMeta, records: &[Record]) -> AppResult<PgQuery> {
    let columns: Vec<&ColumnDef> = meta.columns().collect();

    let mut query = PgQuery::new("INSERT INTO ");
    query.push(meta.table).push(" (");
    push_names(&mut query, &columns);
    query.push(") VALUES ");
    for (row, record) in records.iter().enumerate() {
        if row > 0 {
            query.push(", ");
        }
        query.push("(");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            let value = record.get(column.name);
            if column.primary_key && value.is_null() {
                query.push("DEFAULT");
            } else {
                push_value(&mut query, column, value)?;
            }
        }
        query.push(")");
    }
    Ok(query)
}

/// Rows per multi-row insert that keep a statement under the bind limit.
pub fn rows_per_insert(meta: &EntityMeta) -> usize {
    (MAX_BIND_PARAMS / meta.columns().count().max(1)).max(1)
}

fn column_list(meta: &EntityMeta) -> String {
    meta.columns().map(|c| c.name).collect::<Vec<_>>().join(", ")
}

fn push_names(query: &mut PgQuery, columns: &[&ColumnDef]) {
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            query.push(", ");
        }
        query.push(column.name);
    }
}

/// `WHERE (g1) OR (g2) ..`, with the outer live predicate when requested.
/// Empty groups are skipped.
fn push_where(query: &mut PgQuery, meta: &EntityMeta, example: &Example) -> AppResult<()> {
    let groups: Vec<_> = example
        .ored_criteria()
        .iter()
        .filter(|g| !g.is_empty())
        .collect();

    if !groups.is_empty() {
        query.push(" WHERE (");
        for (i, group) in groups.iter().enumerate() {
            if i > 0 {
                query.push(" OR ");
            }
            query.push("(");
            for (j, criterion) in group.all().iter().enumerate() {
                if j > 0 {
                    query.push(" AND ");
                }
                push_criterion(query, meta, criterion)?;
            }
            query.push(")");
        }
        query.push(")");
    }

    if example.is_outer_live() {
        query
            .push(if groups.is_empty() { " WHERE " } else { " AND " })
            .push(DEL_FLAG_COLUMN)
            .push(" = ")
            .push_bind(DeleteFlag::Exist.code().to_string());
    }
    Ok(())
}

fn push_order_by(query: &mut PgQuery, meta: &EntityMeta, example: &Example) -> AppResult<()> {
    for (i, order) in example.orders().iter().enumerate() {
        let column = meta.column(&order.column)?;
        query
            .push(if i == 0 { " ORDER BY " } else { ", " })
            .push(column.name)
            .push(" ")
            .push(order.direction.as_sql());
    }
    Ok(())
}

fn push_criterion(query: &mut PgQuery, meta: &EntityMeta, criterion: &Criterion) -> AppResult<()> {
    let column = meta.column(&criterion.column)?;
    query.push(column.name);
    match &criterion.condition {
        Condition::IsNull => {
            query.push(" IS NULL");
        }
        Condition::IsNotNull => {
            query.push(" IS NOT NULL");
        }
        Condition::Eq(v) => push_compare(query, column, " = ", v)?,
        Condition::Ne(v) => push_compare(query, column, " <> ", v)?,
        Condition::Gt(v) => push_compare(query, column, " > ", v)?,
        Condition::Gte(v) => push_compare(query, column, " >= ", v)?,
        Condition::Lt(v) => push_compare(query, column, " < ", v)?,
        Condition::Lte(v) => push_compare(query, column, " <= ", v)?,
        Condition::Like(pattern) => push_like(query, column, " LIKE ", pattern)?,
        Condition::NotLike(pattern) => push_like(query, column, " NOT LIKE ", pattern)?,
        Condition::In(list) => push_list(query, column, " IN ", list)?,
        Condition::NotIn(list) => push_list(query, column, " NOT IN ", list)?,
        Condition::Between(low, high) => push_range(query, column, " BETWEEN ", low, high)?,
        Condition::NotBetween(low, high) => {
            push_range(query, column, " NOT BETWEEN ", low, high)?
        }
    }
    Ok(())
}

fn push_compare(query: &mut PgQuery, column: &ColumnDef, op: &str, value: &Value) -> AppResult<()> {
    query.push(op);
    push_value(query, column, value)
}

fn push_like(query: &mut PgQuery, column: &ColumnDef, op: &str, pattern: &Value) -> AppResult<()> {
    query.push(op);
    match pattern {
        Value::Text(text) => {
            query.push_bind(text.clone());
            Ok(())
        }
        Value::Null => {
            query.push("NULL");
            Ok(())
        }
        other => Err(AppError::validation(format!(
            "Column '{}': LIKE needs a text pattern, found {}",
            column.name,
            other.type_name()
        ))),
    }
}

fn push_list(query: &mut PgQuery, column: &ColumnDef, op: &str, list: &Value) -> AppResult<()> {
    let items = match list {
        Value::List(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    if items.is_empty() {
        // `IN ()` is a syntax error in PostgreSQL.
        query.push(if op == " IN " { " IS NULL AND FALSE" } else { " IS NOT NULL" });
        return Ok(());
    }
    query.push(op).push("(");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            query.push(", ");
        }
        push_value(query, column, item)?;
    }
    query.push(")");
    Ok(())
}

fn push_range(
    query: &mut PgQuery,
    column: &ColumnDef,
    op: &str,
    low: &Value,
    high: &Value,
) -> AppResult<()> {
    query.push(op);
    push_value(query, column, low)?;
    query.push(" AND ");
    push_value(query, column, high)
}

/// Bind a value as the type declared for its column.
fn push_value(query: &mut PgQuery, column: &ColumnDef, value: &Value) -> AppResult<()> {
    match (column.kind, value) {
        (_, Value::Null) => {
            query.push("NULL");
        }
        (ColumnType::Bool, Value::Bool(b)) => {
            query.push_bind(*b);
        }
        (ColumnType::Int, Value::Int(i)) => {
            let narrow = i32::try_from(*i).map_err(|_| {
                AppError::validation(format!(
                    "Column '{}': {i} does not fit in an integer column",
                    column.name
                ))
            })?;
            query.push_bind(narrow);
        }
        (ColumnType::BigInt, Value::Int(i)) => {
            query.push_bind(*i);
        }
        (ColumnType::Double, Value::Float(f)) => {
            query.push_bind(*f);
        }
        (ColumnType::Double, Value::Int(i)) => {
            query.push_bind(*i as f64);
        }
        (ColumnType::Text, Value::Text(s)) => {
            query.push_bind(s.clone());
        }
        (ColumnType::Timestamp, Value::Timestamp(ts)) => {
            query.push_bind(*ts);
        }
        (ColumnType::Uuid, Value::Uuid(id)) => {
            query.push_bind(*id);
        }
        (ColumnType::Uuid, Value::Text(_)) => {
            let id = value.clone().into_uuid()?;
            query.push_bind(id);
        }
        (ColumnType::Bytes, Value::Bytes(bytes)) => {
            query.push_bind(bytes.clone());
        }
        (kind, other) => {
            return Err(AppError::validation(format!(
                "Column '{}' of type {kind:?} cannot take a {} value",
                column.name,
                other.type_name()
            )));
        }
    }
    Ok(())
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crudbase_core::error::ErrorKind;
    use crudbase_core::types::SortDirection;

    static ITEM: EntityMeta = EntityMeta::new(
        "item",
        &[
            ColumnDef::key("id", ColumnType::BigInt),
            ColumnDef::new("name", ColumnType::Text),
            ColumnDef::new("qty", ColumnType::Int),
        ],
    );

    const ALL: &str = "id, name, qty, del_flag, create_user, create_time, update_user, update_time";

    #[test]
    fn test_select_groups_and_window() {
        let mut example = Example::new();
        example.create_criteria().and_equal_to("name", "a").and_greater_than("qty", 2i64);
        example.create_criteria().and_in("id", vec![1i64, 2, 3]);
        example.and_live().order_by("name", SortDirection::Desc);

        let query = select(&ITEM, &example, Some(PageWindow::new(2, 10))).unwrap();
        assert_eq!(
            query.sql(),
            format!(
                "SELECT {ALL} FROM item WHERE ((name = $1 AND qty > $2 AND del_flag = $3) \
                 OR (id IN ($4, $5, $6) AND del_flag = $7)) ORDER BY name DESC LIMIT $8 OFFSET $9"
            )
        );
    }

    #[test]
    fn test_outer_live_wraps_groups() {
        let mut example = Example::new();
        example.create_criteria().and_equal_to("id", 1i64);
        example.create_criteria().and_is_null("name");
        example.and_live_outside();

        let query = count(&ITEM, &example).unwrap();
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM item WHERE ((id = $1) OR (name IS NULL)) AND del_flag = $2"
        );
    }

    #[test]
    fn test_empty_groups_render_no_where() {
        let mut example = Example::new();
        example.ensure_criteria();
        let query = delete(&ITEM, &example).unwrap();
        assert_eq!(query.sql(), "DELETE FROM item");
    }

    #[test]
    fn test_update_skips_keys_and_nulls_when_selective() {
        let record = Record::new()
            .with("id", 9i64)
            .with("name", "renamed")
            .with(DEL_FLAG_COLUMN, DeleteFlag::Deleted);
        let mut example = Example::new();
        example.create_criteria().and_equal_to("id", 9i64);

        let query = update(&ITEM, &record, &example, true).unwrap();
        assert_eq!(
            query.sql(),
            "UPDATE item SET name = $1, del_flag = $2 WHERE ((id = $3))"
        );

        let full = update(&ITEM, &record, &example, false).unwrap();
        assert!(full.sql().starts_with("UPDATE item SET name = $1, qty = NULL, del_flag = $2"));
    }

    #[test]
    fn test_selective_update_needs_a_column() {
        let record = Record::new().with("id", 9i64);
        let err = update(&ITEM, &record, &Example::new(), true).err().unwrap();
        assert_eq!(err.message, messages::NOTHING_TO_UPDATE);
    }

    #[test]
    fn test_insert_leaves_null_key_to_default() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let record = Record::new()
            .with("name", "pen")
            .with("qty", 3i64)
            .with("create_time", now);

        let query = insert(&ITEM, &record, true).unwrap();
        assert_eq!(
            query.sql(),
            "INSERT INTO item (name, qty, create_time) VALUES ($1, $2, $3)"
        );

        let query = insert(&ITEM, &record, false).unwrap();
        assert!(query.sql().starts_with("INSERT INTO item (name, qty, del_flag"));
    }

    #[test]
    fn test_insert_many_uses_default_for_missing_keys() {
        let rows = vec![
            Record::new().with("name", "a"),
            Record::new().with("id", 4i64).with("name", "b"),
        ];
        let query = insert_many(&ITEM, &rows).unwrap();
        assert_eq!(
            query.sql(),
            format!(
                "INSERT INTO item ({ALL}) VALUES \
                 (DEFAULT, $1, NULL, NULL, NULL, NULL, NULL, NULL), \
                 ($2, $3, NULL, NULL, NULL, NULL, NULL, NULL)"
            )
        );
    }

    #[test]
    fn test_type_checks() {
        let mut example = Example::new();
        example.create_criteria().and_equal_to("qty", i64::MAX);
        let err = count(&ITEM, &example).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Validation);

        let mut example = Example::new();
        example.create_criteria().and_equal_to("name", 1i64);
        assert!(count(&ITEM, &example).is_err());

        let mut example = Example::new();
        example.create_criteria().and_equal_to("missing", 1i64);
        assert!(count(&ITEM, &example).is_err());
    }

    #[test]
    fn test_empty_in_list_selects_nothing() {
        let mut example = Example::new();
        example.create_criteria().and_in("id", Vec::<i64>::new());
        let query = count(&ITEM, &example).unwrap();
        assert_eq!(
            query.sql(),
            "SELECT COUNT(*) FROM item WHERE ((id IS NULL AND FALSE))"
        );
    }

    #[test]
    fn test_rows_per_insert_respects_bind_limit() {
        assert_eq!(rows_per_insert(&ITEM), MAX_BIND_PARAMS / 8);
    }
}
