//! Database operations for the laundry `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` - Staff accounts (local password or federated subject)
//! - `sessions` - Opaque session tokens (stored as SHA-256 digests)
//! - `customers` - Customers keyed by (name, phone)
//! - `orders`, `order_items`, `order_events` - Orders with line items and audit trail
//! - `product_types`, `stock` - Catalog and per-product available quantity
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p laundry-cli -- migrate
//! ```
//!
//! All queries go through the runtime `sqlx::query`/`query_as` API with
//! `FromRow` row types, so no database is needed at build time.

pub mod inventory;
pub mod orders;
pub mod sessions;
pub mod users;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use laundry_core::ErrorKind;

use crate::config::DatabaseConfig;

pub use inventory::InventoryRepository;
pub use orders::OrderRepository;
pub use sessions::SessionRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Classify this error for callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Database(e) if is_unavailable(e) => ErrorKind::Unavailable,
            Self::Database(_) | Self::DataCorruption(_) => ErrorKind::Internal,
            Self::NotFound => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
        }
    }
}

/// Whether a sqlx error means the store could not be reached at all.
fn is_unavailable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    )
}

/// Map a unique violation onto `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(err)
}

/// Whether the error is a violation of the named check constraint.
pub(crate) fn is_check_violation(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.is_check_violation() && db_err.constraint() == Some(constraint)
    )
}

/// Whether the error is `numeric_value_out_of_range` (SQLSTATE 22003).
pub(crate) fn is_numeric_overflow(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE)
    )
}

/// Create a `PostgreSQL` connection pool sized from configuration.
///
/// Callers block for up to `acquire_timeout` when every connection is in use.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    pool_options(config)
        .connect(config.url.expose_secret())
        .await
}

/// Create a pool that connects on first use.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection URL cannot be parsed.
pub fn create_lazy_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    pool_options(config).connect_lazy(config.url.expose_secret())
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
}

/// Check that the database answers a trivial query.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the store is unreachable.
pub async fn ping(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
