//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::identity::VerifyError;
use crate::services::{
    AuthService, GoogleTokenVerifier, InventoryService, OrderService, SessionManager,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The pool is constructed by the
/// process entry point and injected here; services borrow it per request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    verifier: GoogleTokenVerifier,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError` if the identity verifier's HTTP client cannot be
    /// built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, VerifyError> {
        let verifier = GoogleTokenVerifier::new()?;
        Ok(Self::with_verifier(config, pool, verifier))
    }

    /// Create application state with an explicit verifier.
    #[must_use]
    pub fn with_verifier(config: ApiConfig, pool: PgPool, verifier: GoogleTokenVerifier) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                verifier,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_, GoogleTokenVerifier> {
        AuthService::new(&self.inner.pool, &self.inner.verifier, &self.inner.config.auth)
    }

    /// Session manager bound to this state.
    #[must_use]
    pub fn sessions(&self) -> SessionManager<'_> {
        SessionManager::new(&self.inner.pool, self.inner.config.auth.session_ttl)
    }

    /// Inventory service bound to this state.
    #[must_use]
    pub fn inventory(&self) -> InventoryService<'_> {
        InventoryService::new(&self.inner.pool)
    }

    /// Order service bound to this state.
    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(&self.inner.pool)
    }
}
