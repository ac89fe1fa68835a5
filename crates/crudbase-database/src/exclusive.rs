//! Optimistic-concurrency ("exclusive") updates.
//!
//! An exclusive update only touches live rows whose `update_time` still
//! equals the value the caller last observed. When nothing matched, the
//! rows are counted again without the timestamp guard to tell a concurrent
//! modification from a row that no longer exists.
//!
//! Every successful exclusive update moves `update_time` past the guarded
//! value, so a second writer holding the same observation always conflicts.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::warn;

use crudbase_core::error::AppError;
use crudbase_core::messages;
use crudbase_core::result::AppResult;
use crudbase_core::traits::Dao;
use crudbase_core::types::Example;
use crudbase_entity::Entity;

/// Run an exclusive update of the rows matching `example`.
///
/// `selective` writes only non-null columns. The entity's
/// `update_last_time` is required. Its `update_time` is ignored and replaced
/// by [`next_stamp`].
pub async fn update<E, D>(dao: &D, entity: &E, example: Example, selective: bool) -> AppResult<u64>
where
    E: Entity,
    D: Dao<E> + ?Sized,
{
    let last = entity
        .base()
        .update_last_time
        .ok_or_else(|| AppError::validation(messages::UPDATE_LAST_TIME_MISSING))?;

    let mut target = example;
    target.ensure_criteria().and_live();
    let mut guarded = target.clone();
    guarded.and_update_time_equal_to(last);

    let mut stamped = entity.clone();
    stamped.base_mut().update_time = Some(next_stamp(last));

    let rows = if selective {
        dao.update_by_example_selective(&stamped, &guarded).await?
    } else {
        dao.update_by_example(&stamped, &guarded).await?
    };
    if rows == 0 {
        return Err(zero_rows(dao, &target).await);
    }
    Ok(rows)
}

/// The current time at millisecond precision, at least 1ms after `last`.
pub fn next_stamp(last: DateTime<Utc>) -> DateTime<Utc> {
    let floor = last.trunc_subsecs(3) + Duration::milliseconds(1);
    Utc::now().trunc_subsecs(3).max(floor)
}

async fn zero_rows<E, D>(dao: &D, target: &Example) -> AppError
where
    E: Entity,
    D: Dao<E> + ?Sized,
{
    match dao.count_by_example(target).await {
        Ok(0) => AppError::not_found(messages::EXCLUSIVE_TARGET_MISSING),
        Ok(live) => {
            warn!(
                table = E::meta().table,
                live, "Exclusive update lost to a concurrent modification"
            );
            AppError::conflict(messages::EXCLUSIVE_CONFLICT)
        }
        Err(err) => err,
    }
}
