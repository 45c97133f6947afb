//! Staff account management commands.
//!
//! Accounts are normally created through registration or the bootstrap admin
//! settings; these commands cover the cases where an operator needs to act
//! without the HTTP API.

use thiserror::Error;

use laundry_api::db::{RepositoryError, UserRepository};
use laundry_api::services::{AuthError, AuthService, GoogleTokenVerifier};
use laundry_api::services::identity::VerifyError;
use laundry_core::UserId;

use super::{ConnectError, connect};

/// Account management errors.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Failed to build identity client: {0}")]
    Verifier(#[from] VerifyError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    /// No account with this username.
    #[error("No user named {0}")]
    UserNotFound(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Create a local account.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create_user(username: &str, password: &str) -> Result<UserId, AdminError> {
    let (config, pool) = connect().await?;
    // Local account creation never calls the identity provider
    let verifier = GoogleTokenVerifier::new()?;
    let auth = AuthService::new(&pool, &verifier, &config.auth);

    tracing::info!("Creating user: {}", username.trim());
    let user = auth.create_user(username, password).await?;

    tracing::info!(user_id = %user.id, "User created successfully");
    pool.close().await;
    Ok(user.id)
}

/// Activate or deactivate an account.
///
/// Deactivated users fail login, and their existing sessions stop resolving
/// to a user.
pub async fn set_active(username: &str, active: bool) -> Result<(), AdminError> {
    let (_config, pool) = connect().await?;

    let user = UserRepository::new(&pool)
        .set_active(username, active)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(username.to_owned()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, active, "User updated");
    pool.close().await;
    Ok(())
}
