//! Session repository.
//!
//! Rows are keyed by the SHA-256 digest of the bearer token; the token
//! itself is never written to the database.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use laundry_core::UserId;

use super::RepositoryError;

/// Internal row type for session lookups.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    user_id: i32,
    expires_at: DateTime<Utc>,
}

/// A stored session as seen by the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            expires_at: row.expires_at,
        }
    }
}

/// Repository for session database operations.
pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a new session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO sessions (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(token_hash)
        .bind(user_id.as_i32())
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Find a session whose expiry is not before `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_valid(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT user_id, expires_at
            FROM sessions
            WHERE token_hash = $1 AND expires_at >= $2
            ",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Delete a session. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every session that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
