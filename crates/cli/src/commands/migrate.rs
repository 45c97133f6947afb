//! Database migration commands.

use thiserror::Error;

use laundry_api::db::MIGRATOR;

use super::{ConnectError, connect};

/// Migration errors.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// Already-applied migrations are skipped, so running this twice is a no-op.
pub async fn run() -> Result<(), MigrateError> {
    let (_config, pool) = connect().await?;

    let known = MIGRATOR.iter().count();
    tracing::info!(migrations = known, "Running migrations...");
    MIGRATOR.run(&pool).await?;

    pool.close().await;
    tracing::info!("Migrations complete");
    Ok(())
}
