//! In-process store evaluating criteria directly against records.

use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crudbase_core::error::AppError;
use crudbase_core::messages;
use crudbase_core::result::AppResult;
use crudbase_core::traits::{BulkDao, Dao, UnitOfWork};
use crudbase_core::types::{Example, OrderBy, PageWindow, Record, SortDirection, Value};
use crudbase_entity::{ColumnType, Entity};

use crate::bulk;

type Rows = Arc<Mutex<Vec<Record>>>;

/// Transaction state of a scoped store.
#[derive(Debug, Clone)]
struct Scope {
    /// Rows the working copy is written back to on commit.
    parent: Rows,
    owner: bool,
}

/// [`Dao`], [`BulkDao`] and [`UnitOfWork`] for entity `E` kept in memory.
///
/// A transaction works on a snapshot of the table that replaces it on
/// commit; the last commit wins. Null integer and uuid keys are generated on
/// insert.
pub struct MemoryStore<E> {
    rows: Rows,
    scope: Option<Scope>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for MemoryStore<E> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            scope: self.scope.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for MemoryStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("scoped", &self.scope.is_some())
            .finish()
    }
}

impl<E: Entity> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> MemoryStore<E> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            scope: None,
            _entity: PhantomData,
        }
    }

    /// Every stored row, soft-deleted ones included.
    pub async fn rows(&self) -> AppResult<Vec<E>> {
        let rows = self.rows.lock().await;
        rows.iter().cloned().map(E::from_record).collect()
    }

    async fn insert_record(&self, mut record: Record) -> AppResult<u64> {
        let meta = E::meta();
        let mut rows = self.rows.lock().await;

        for key in meta.primary_keys() {
            if !record.get(key.name).is_null() {
                continue;
            }
            let generated = match key.kind {
                ColumnType::Int | ColumnType::BigInt => {
                    let max = rows
                        .iter()
                        .filter_map(|r| match r.get(key.name) {
                            Value::Int(i) => Some(*i),
                            _ => None,
                        })
                        .max()
                        .unwrap_or(0);
                    Value::Int(max + 1)
                }
                ColumnType::Uuid => Value::Uuid(Uuid::new_v4()),
                _ => return Err(AppError::validation(messages::PRIMARY_KEY_VALUE_MISSING)),
            };
            record.set(key.name, generated);
        }

        let keys = meta.primary_keys();
        if let Ok(key) = meta.key_example(&key_of(keys.iter().map(|k| k.name), &record)) {
            if rows.iter().any(|r| key.matches(r)) {
                return Err(AppError::conflict(format!(
                    "Duplicate primary key in table '{}'",
                    meta.table
                )));
            }
        }

        rows.push(record);
        debug!(table = meta.table, rows = 1, "Row inserted");
        Ok(1)
    }

    async fn update_matching(
        &self,
        entity: &E,
        example: &Example,
        selective: bool,
    ) -> AppResult<u64> {
        let meta = E::meta();
        meta.check_example(example)?;
        let record = entity.to_record();
        let changes: Vec<(&'static str, &Value)> = meta
            .columns()
            .filter(|c| !c.primary_key)
            .map(|c| (c.name, record.get(c.name)))
            .filter(|(_, v)| !selective || !v.is_null())
            .collect();
        if changes.is_empty() {
            return Err(AppError::validation(messages::NOTHING_TO_UPDATE));
        }

        let mut rows = self.rows.lock().await;
        let mut updated = 0;
        for row in rows.iter_mut().filter(|r| example.matches(r)) {
            for (column, value) in &changes {
                row.set(*column, (*value).clone());
            }
            updated += 1;
        }
        debug!(table = meta.table, rows = updated, "Rows updated");
        Ok(updated)
    }
}

fn key_of<'a>(names: impl Iterator<Item = &'a str>, record: &Record) -> Value {
    let mut values: Vec<Value> = names.map(|n| record.get(n).clone()).collect();
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::List(values)
    }
}

/// Order rows the way PostgreSQL does: nulls sort last ascending and first
/// descending.
fn compare_rows(a: &Record, b: &Record, orders: &[OrderBy]) -> Ordering {
    for order in orders {
        let (x, y) = (a.get(&order.column), b.get(&order.column));
        let ordering = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => x.compare(y).unwrap_or(Ordering::Equal),
        };
        let ordering = match order.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl<E: Entity> Dao<E> for MemoryStore<E> {
    async fn insert(&self, entity: &E) -> AppResult<u64> {
        self.insert_record(entity.to_record()).await
    }

    async fn insert_selective(&self, entity: &E) -> AppResult<u64> {
        self.insert_record(entity.to_record()).await
    }

    async fn update_by_primary_key(&self, entity: &E) -> AppResult<u64> {
        let example = entity.primary_key_example()?;
        self.update_matching(entity, &example, false).await
    }

    async fn update_by_primary_key_selective(&self, entity: &E) -> AppResult<u64> {
        let example = entity.primary_key_example()?;
        self.update_matching(entity, &example, true).await
    }

    async fn update_by_example(&self, entity: &E, example: &Example) -> AppResult<u64> {
        self.update_matching(entity, example, false).await
    }

    async fn update_by_example_selective(&self, entity: &E, example: &Example) -> AppResult<u64> {
        self.update_matching(entity, example, true).await
    }

    async fn delete(&self, entity: &E) -> AppResult<u64> {
        let example = entity.primary_key_example()?;
        self.delete_by_example(&example).await
    }

    async fn delete_by_example(&self, example: &Example) -> AppResult<u64> {
        E::meta().check_example(example)?;
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|r| !example.matches(r));
        let deleted = (before - rows.len()) as u64;
        debug!(table = E::meta().table, rows = deleted, "Rows deleted");
        Ok(deleted)
    }

    async fn select_by_primary_key(&self, id: &Value) -> AppResult<Option<E>> {
        let example = E::meta().key_example(id)?;
        let rows = self.rows.lock().await;
        rows.iter()
            .find(|r| example.matches(r))
            .cloned()
            .map(E::from_record)
            .transpose()
    }

    async fn select_by_example(
        &self,
        example: &Example,
        window: Option<PageWindow>,
    ) -> AppResult<Vec<E>> {
        E::meta().check_example(example)?;
        let mut matched: Vec<Record> = {
            let rows = self.rows.lock().await;
            rows.iter().filter(|r| example.matches(r)).cloned().collect()
        };
        matched.sort_by(|a, b| compare_rows(a, b, example.orders()));

        let (skip, take) = match window {
            Some(w) => (w.offset(), w.limit()),
            None => (0, u64::MAX),
        };
        matched
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(take).unwrap_or(usize::MAX))
            .map(E::from_record)
            .collect()
    }

    async fn count_by_example(&self, example: &Example) -> AppResult<u64> {
        E::meta().check_example(example)?;
        let rows = self.rows.lock().await;
        Ok(rows.iter().filter(|r| example.matches(r)).count() as u64)
    }
}

#[async_trait]
impl<E: Entity> BulkDao<E> for MemoryStore<E> {
    async fn insert_list(&self, entities: &[E]) -> AppResult<u64> {
        if entities.is_empty() {
            return Ok(0);
        }
        let scope = self.begin().await?;
        let mut result = Ok(0);
        for entity in entities {
            match scope.insert_record(entity.to_record()).await {
                Ok(rows) => result = result.map(|total| total + rows),
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        scope.settle(result).await
    }

    async fn update_list(
        &self,
        entities: &[E],
        selective: bool,
        exclusive: bool,
    ) -> AppResult<u64> {
        bulk::update_each(self, entities, selective, exclusive).await
    }
}

#[async_trait]
impl<E: Entity> UnitOfWork for MemoryStore<E> {
    async fn begin(&self) -> AppResult<Self> {
        if self.scope.is_some() {
            return Ok(Self {
                rows: Arc::clone(&self.rows),
                scope: self.scope.clone().map(|s| Scope { owner: false, ..s }),
                _entity: PhantomData,
            });
        }
        let snapshot = self.rows.lock().await.clone();
        Ok(Self {
            rows: Arc::new(Mutex::new(snapshot)),
            scope: Some(Scope {
                parent: Arc::clone(&self.rows),
                owner: true,
            }),
            _entity: PhantomData,
        })
    }

    async fn commit(self) -> AppResult<()> {
        if let Some(Scope {
            parent,
            owner: true,
        }) = self.scope
        {
            let working = self.rows.lock().await.clone();
            *parent.lock().await = working;
        }
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        Ok(())
    }
}
