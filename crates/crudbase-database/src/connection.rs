//! PostgreSQL connection pool management and transaction-aware handles.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crudbase_core::config::DatabaseConfig;
use crudbase_core::error::{AppError, ErrorKind};
use crudbase_core::result::AppResult;

/// Wrapper around the sqlx PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    /// The underlying sqlx connection pool.
    pool: PgPool,
}

impl DatabasePool {
    /// Create a new database pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        info!("Successfully connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// A handle executing on the pool outside any transaction.
    pub fn handle(&self) -> DbHandle {
        DbHandle::Pool(self.pool.clone())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Where statements run: straight on the pool or inside a transaction.
///
/// Transaction handles are shared. [`begin`](DbHandle::begin) on a
/// transaction handle joins it, and only the handle that opened the
/// transaction commits or rolls it back.
#[derive(Clone)]
pub enum DbHandle {
    Pool(PgPool),
    Tx {
        tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
        owner: bool,
    },
}

impl std::fmt::Debug for DbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pool(_) => f.write_str("DbHandle::Pool"),
            Self::Tx { owner, .. } => f.debug_struct("DbHandle::Tx").field("owner", owner).finish(),
        }
    }
}

impl DbHandle {
    /// Run a statement and return the number of affected rows.
    pub async fn execute(&self, mut query: QueryBuilder<'static, Postgres>) -> AppResult<u64> {
        debug!(sql = query.sql(), "Executing statement");
        let result = match self {
            Self::Pool(pool) => query.build().execute(pool).await,
            Self::Tx { tx, .. } => {
                let mut guard = tx.lock().await;
                let conn = guard.as_mut().ok_or_else(closed)?;
                query.build().execute(&mut **conn).await
            }
        };
        result
            .map(|done| done.rows_affected())
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to execute statement", e))
    }

    /// Run a query and return every row.
    pub async fn fetch_all(&self, mut query: QueryBuilder<'static, Postgres>) -> AppResult<Vec<PgRow>> {
        debug!(sql = query.sql(), "Running query");
        let result = match self {
            Self::Pool(pool) => query.build().fetch_all(pool).await,
            Self::Tx { tx, .. } => {
                let mut guard = tx.lock().await;
                let conn = guard.as_mut().ok_or_else(closed)?;
                query.build().fetch_all(&mut **conn).await
            }
        };
        result.map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to run query", e))
    }

    /// Run a `COUNT(*)` query.
    pub async fn fetch_count(&self, mut query: QueryBuilder<'static, Postgres>) -> AppResult<u64> {
        debug!(sql = query.sql(), "Running count");
        let result = match self {
            Self::Pool(pool) => query.build_query_scalar::<i64>().fetch_one(pool).await,
            Self::Tx { tx, .. } => {
                let mut guard = tx.lock().await;
                let conn = guard.as_mut().ok_or_else(closed)?;
                query.build_query_scalar::<i64>().fetch_one(&mut **conn).await
            }
        };
        result
            .map(|count| u64::try_from(count).unwrap_or(0))
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count rows", e))
    }

    /// Open a transaction, or join the one this handle is bound to.
    pub async fn begin(&self) -> AppResult<Self> {
        match self {
            Self::Pool(pool) => {
                let tx = pool.begin().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
                })?;
                Ok(Self::Tx {
                    tx: Arc::new(Mutex::new(Some(tx))),
                    owner: true,
                })
            }
            Self::Tx { tx, .. } => Ok(Self::Tx {
                tx: Arc::clone(tx),
                owner: false,
            }),
        }
    }

    /// Commit the transaction this handle opened. A no-op otherwise.
    pub async fn commit(self) -> AppResult<()> {
        if let Some(tx) = self.take_owned().await? {
            tx.commit().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
            })?;
        }
        Ok(())
    }

    /// Roll back the transaction this handle opened. A no-op otherwise.
    pub async fn rollback(self) -> AppResult<()> {
        if let Some(tx) = self.take_owned().await? {
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back transaction", e)
            })?;
        }
        Ok(())
    }

    async fn take_owned(self) -> AppResult<Option<Transaction<'static, Postgres>>> {
        match self {
            Self::Tx { tx, owner: true } => tx.lock().await.take().map(Some).ok_or_else(closed),
            _ => Ok(None),
        }
    }
}

fn closed() -> AppError {
    AppError::database("Transaction is already finished")
}

/// Mask the password portion of a database URL for safe logging.
fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
