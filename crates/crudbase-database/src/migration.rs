//! Database migration runner.

use std::path::PathBuf;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use crudbase_core::error::{AppError, ErrorKind};
use crudbase_core::result::AppResult;

/// Run all pending migrations found in `dir`.
pub async fn run_migrations(pool: &PgPool, dir: &str) -> AppResult<()> {
    info!(dir, "Running database migrations...");

    let migrator = Migrator::new(PathBuf::from(dir)).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Failed to load migrations from '{dir}': {e}"),
            e,
        )
    })?;

    migrator.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Database migrations completed successfully");
    Ok(())
}
