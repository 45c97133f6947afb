//! Session maintenance commands.

use thiserror::Error;

use laundry_api::services::{SessionError, SessionManager};

use super::{ConnectError, connect};

/// Session maintenance errors.
#[derive(Debug, Error)]
pub enum SessionsError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("{0}")]
    Session(#[from] SessionError),
}

/// Delete every expired session.
///
/// The API server does this hourly; this is for one-off cleanup.
pub async fn purge() -> Result<u64, SessionsError> {
    let (config, pool) = connect().await?;

    let purged = SessionManager::new(&pool, config.auth.session_ttl)
        .purge_expired()
        .await?;

    tracing::info!(purged, "Expired sessions deleted");
    pool.close().await;
    Ok(purged)
}
