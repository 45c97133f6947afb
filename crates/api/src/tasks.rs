//! Background maintenance tasks.

use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::services::SessionManager;

/// How often expired sessions are purged.
pub const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Periodically delete expired sessions.
///
/// Expiry is enforced at validation time, so this only reclaims storage.
/// Failures are logged and retried on the next tick.
pub fn spawn_session_purge(pool: PgPool, ttl: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match SessionManager::new(&pool, ttl).purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "Purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
            }
        }
    })
}
