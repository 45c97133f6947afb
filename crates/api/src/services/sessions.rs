//! Session lifecycle: issue, validate, revoke.
//!
//! Tokens are 32 random bytes, base64url-encoded. Only their SHA-256 digest
//! is stored. Expiry is checked at validation time; `purge_expired` exists for
//! storage hygiene only.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use laundry_core::{ErrorKind, UserId};

use crate::db::{RepositoryError, SessionRepository, UserRepository};
use crate::models::{IssuedSession, SessionToken, User};

/// Bytes of entropy in a session token.
pub const TOKEN_BYTES: usize = 32;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configured lifetime cannot be represented as a timestamp offset.
    #[error("session lifetime out of range")]
    TtlOutOfRange,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl SessionError {
    /// Classify this error for callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TtlOutOfRange => ErrorKind::Internal,
            Self::Repository(e) => e.kind(),
        }
    }
}

/// Issues and checks opaque session tokens.
pub struct SessionManager<'a> {
    sessions: SessionRepository<'a>,
    users: UserRepository<'a>,
    ttl: Duration,
}

impl<'a> SessionManager<'a> {
    /// Create a session manager issuing sessions that live for `ttl`.
    #[must_use]
    pub const fn new(pool: &'a PgPool, ttl: Duration) -> Self {
        Self {
            sessions: SessionRepository::new(pool),
            users: UserRepository::new(pool),
            ttl,
        }
    }

    /// Issue a new session for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TtlOutOfRange` if the expiry overflows.
    /// Returns `SessionError::Repository` if the session cannot be stored.
    #[instrument(skip(self))]
    pub async fn issue(&self, user_id: UserId) -> Result<IssuedSession, SessionError> {
        let expires_at = expiry_after(Utc::now(), self.ttl).ok_or(SessionError::TtlOutOfRange)?;
        let token = generate_token();

        self.sessions
            .insert(&hash_token(&token), user_id, expires_at)
            .await?;

        Ok(IssuedSession { token, expires_at })
    }

    /// Resolve a token to its user.
    ///
    /// Returns `None` for a missing, unknown or expired token. Does not look at
    /// the user's `active` flag; see [`Self::current_user`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if the lookup fails.
    pub async fn validate(&self, token: Option<&str>) -> Result<Option<UserId>, SessionError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let now = Utc::now();
        let record = self.sessions.find_valid(&hash_token_str(token), now).await?;

        Ok(record
            .filter(|r| is_live(r.expires_at, now))
            .map(|r| r.user_id))
    }

    /// Resolve a token to an active user.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if a lookup fails.
    pub async fn current_user(&self, token: Option<&str>) -> Result<Option<User>, SessionError> {
        let Some(user_id) = self.validate(token).await? else {
            return Ok(None);
        };

        let user = self.users.get_by_id(user_id).await?;
        Ok(user.filter(User::is_active))
    }

    /// Revoke a session. Unknown or already revoked tokens are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if the delete fails.
    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        let removed = self.sessions.delete(&hash_token_str(token)).await?;
        tracing::debug!(removed, "Session revoked");
        Ok(())
    }

    /// Delete expired sessions, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Repository` if the delete fails.
    pub async fn purge_expired(&self) -> Result<u64, SessionError> {
        let purged = self.sessions.delete_expired(Utc::now()).await?;
        Ok(purged)
    }
}

/// Generate a fresh URL-safe token from the thread-local CSPRNG.
#[must_use]
pub fn generate_token() -> SessionToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    SessionToken::new(URL_SAFE_NO_PAD.encode(bytes))
}

/// Storage key for a token.
#[must_use]
pub fn hash_token(token: &SessionToken) -> String {
    hash_token_str(token.as_str())
}

fn hash_token_str(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// `now + ttl`, or `None` if it does not fit.
#[must_use]
pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Option<DateTime<Utc>> {
    let delta = TimeDelta::from_std(ttl).ok()?;
    now.checked_add_signed(delta)
}

/// Whether a session expiring at `expires_at` is still usable at `now`.
#[must_use]
pub fn is_live(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now <= expires_at
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_token_is_url_safe_and_long_enough() {
        let token = generate_token();
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(token.as_str().len(), 43);
        assert!(
            token
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..256)
            .map(|_| generate_token().as_str().to_owned())
            .collect();
        assert_eq!(tokens.len(), 256);
    }

    #[test]
    fn test_hash_is_stable_hex_digest() {
        let token = SessionToken::new("abc".to_string());
        let hash = hash_token(&token);
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash, token.as_str());
    }

    #[test]
    fn test_expiry_after_default_ttl() {
        let now = Utc::now();
        let week = Duration::from_secs(7 * 24 * 60 * 60);
        let expires = expiry_after(now, week).unwrap();
        assert_eq!(expires - now, TimeDelta::days(7));
    }

    #[test]
    fn test_expiry_after_overflow() {
        assert!(expiry_after(Utc::now(), Duration::from_secs(u64::MAX)).is_none());
    }

    #[test]
    fn test_is_live_boundaries() {
        let now = Utc::now();
        assert!(is_live(now + TimeDelta::seconds(1), now));
        assert!(is_live(now, now));
        assert!(!is_live(now - TimeDelta::seconds(1), now));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(SessionError::TtlOutOfRange.kind(), ErrorKind::Internal);
        assert_eq!(
            SessionError::Repository(RepositoryError::NotFound).kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_validate_without_token_skips_database() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let manager = SessionManager::new(&pool, Duration::from_secs(60));

        assert_eq!(manager.validate(None).await.unwrap(), None);
        assert_eq!(manager.validate(Some("")).await.unwrap(), None);
        assert!(manager.current_user(None).await.unwrap().is_none());
    }
}
