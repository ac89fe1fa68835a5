//! Synchronizing a stored list with an edited one.

use serde::Serialize;
use tracing::debug;

use crudbase_core::result::AppResult;
use crudbase_core::traits::{BulkDao, Dao, UnitOfWork};
use crudbase_core::types::Value;
use crudbase_entity::Entity;

use super::BaseRepository;

/// Rows touched by [`BaseRepository::reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
}

impl<E, S> BaseRepository<E, S>
where
    E: Entity,
    S: Dao<E> + BulkDao<E> + UnitOfWork,
{
    /// Make the stored rows match `data`.
    ///
    /// Entities of `data` without a `key_column` value are inserted, the
    /// others are updated selectively. Rows of `existing` whose key no longer
    /// appears in `data` are logically deleted with `template`'s audit
    /// columns. Everything runs in one transaction.
    pub async fn reconcile(
        &self,
        data: &[E],
        existing: &[E],
        key_column: &'static str,
        template: &E,
    ) -> AppResult<ReconcileOutcome> {
        E::meta().column(key_column)?;

        let (inserts, updates): (Vec<E>, Vec<E>) = data
            .iter()
            .cloned()
            .partition(|e| e.to_record().get(key_column).is_missing());
        let kept: Vec<Value> = updates
            .iter()
            .map(|e| e.to_record().get(key_column).clone())
            .collect();
        let deletes: Vec<Value> = existing
            .iter()
            .map(|e| e.to_record().get(key_column).clone())
            .filter(|key| !key.is_missing() && !kept.iter().any(|k| k.sql_eq(key)))
            .collect();

        let scope = self.begin().await?;
        let result = scope
            .apply(&inserts, &updates, key_column, &deletes, template)
            .await;
        let outcome = scope.store.settle(result).await?;
        debug!(
            table = E::meta().table,
            inserted = outcome.inserted,
            updated = outcome.updated,
            deleted = outcome.deleted,
            "Reconciled"
        );
        Ok(outcome)
    }

    async fn apply(
        &self,
        inserts: &[E],
        updates: &[E],
        key_column: &str,
        deletes: &[Value],
        template: &E,
    ) -> AppResult<ReconcileOutcome> {
        Ok(ReconcileOutcome {
            inserted: self.insert_list(inserts).await?,
            updated: self.update_by_primary_key_selective_list(updates, false).await?,
            deleted: self
                .delete_logical_by_ids_on(template, key_column, deletes)
                .await?,
        })
    }
}
