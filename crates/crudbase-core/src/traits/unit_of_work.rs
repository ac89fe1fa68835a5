//! Explicit transaction demarcation.

use async_trait::async_trait;
use tracing::warn;

use crate::result::AppResult;

/// A store that can scope its work to a transaction.
///
/// `begin` returns a copy of the store bound to a new transaction. Beginning
/// on a store that is already bound joins the outer transaction; committing
/// a joined scope leaves the decision to the outer one.
#[async_trait]
pub trait UnitOfWork: Sized + Send + Sync {
    /// Start (or join) a transaction.
    async fn begin(&self) -> AppResult<Self>;

    /// Make the transaction's writes durable.
    async fn commit(self) -> AppResult<()>;

    /// Discard the transaction's writes.
    async fn rollback(self) -> AppResult<()>;

    /// Commit when `result` is a success, roll back otherwise.
    ///
    /// A failed rollback is logged and never masks the error that caused it.
    async fn settle<T>(self, result: AppResult<T>) -> AppResult<T>
    where
        T: Send,
    {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.rollback().await {
                    warn!(
                        error = %err,
                        rollback_error = %rollback,
                        "Rollback after a failed unit of work failed"
                    );
                }
                Err(err)
            }
        }
    }
}
