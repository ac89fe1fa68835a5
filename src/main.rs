//! crudbase: connect the data-access layer to PostgreSQL.
//!
//! Loads configuration, initializes logging, opens the pool, checks it,
//! and applies migrations when a directory is configured.

use tracing_subscriber::{EnvFilter, fmt};

use crudbase_core::config::{AppConfig, LoggingConfig};
use crudbase_core::error::AppError;
use crudbase_database::DatabasePool;
use crudbase_database::migration::run_migrations;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Startup failed");
        std::process::exit(1);
    }
}

/// Load configuration from the config directory and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let dir = std::env::var("CRUDBASE_CONFIG").unwrap_or_else(|_| "config".to_string());
    let env = std::env::var("CRUDBASE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load_from(&dir, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting crudbase v{}", env!("CARGO_PKG_VERSION"));

    tracing::info!("Connecting to database...");
    let db = DatabasePool::connect(&config.database).await?;
    db.health_check().await?;

    if let Some(dir) = &config.database.migrations_dir {
        run_migrations(db.pool(), dir).await?;
    }

    tracing::info!(
        page_size = config.page.page_size,
        "Data access layer ready"
    );
    db.close().await;
    Ok(())
}
