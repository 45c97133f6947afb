//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod sessions;

use laundry_api::config::{ApiConfig, ConfigError};
use laundry_api::db;
use sqlx::PgPool;

/// Load configuration and open a pool against the configured database.
async fn connect() -> Result<(ApiConfig, PgPool), ConnectError> {
    let config = ApiConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database).await?;

    Ok((config, pool))
}

/// Errors raised while preparing a database connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}
