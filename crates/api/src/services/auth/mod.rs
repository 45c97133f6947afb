//! Authentication service.
//!
//! Local password login and registration, federated login through an
//! [`IdentityVerifier`], logout, and the startup admin bootstrap. Every
//! successful path ends with a freshly issued session.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use laundry_core::Email;

use crate::config::AuthConfig;
use crate::db::{RepositoryError, UserRepository};
use crate::models::{IssuedSession, User};
use crate::services::identity::IdentityVerifier;
use crate::services::sessions::SessionManager;

/// Minimum username length, in characters.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A user together with the session just issued for them.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub session: IssuedSession,
}

/// Result of the startup admin bootstrap.
#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    Created(User),
    AlreadyExists,
}

/// Authentication service.
pub struct AuthService<'a, V> {
    users: UserRepository<'a>,
    sessions: SessionManager<'a>,
    verifier: &'a V,
    config: &'a AuthConfig,
}

impl<'a, V: IdentityVerifier> AuthService<'a, V> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, verifier: &'a V, config: &'a AuthConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            sessions: SessionManager::new(pool, config.session_ttl),
            verifier,
            config,
        }
    }

    // =========================================================================
    // Local Accounts
    // =========================================================================

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user is unknown, inactive
    /// or the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Authenticated, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active() {
            return Err(AuthError::InvalidCredentials);
        }

        verify_password(password, &password_hash)?;

        let session = self.sessions.issue(user.id).await?;
        tracing::info!(user_id = %user.id, user = user.display_name(), "User logged in");

        Ok(Authenticated { user, session })
    }

    /// Register a local account and log it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` if the username or password is too short.
    /// Returns `AuthError::UsernameTaken` if the username is already registered.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Authenticated, AuthError> {
        let user = self.create_user(username, password).await?;
        let session = self.sessions.issue(user.id).await?;
        tracing::info!(user_id = %user.id, user = user.display_name(), "User registered");

        Ok(Authenticated { user, session })
    }

    /// Create a local account without issuing a session.
    ///
    /// Uniqueness is decided by the database, so concurrent registrations of
    /// the same name produce exactly one account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` if the username or password is too short.
    /// Returns `AuthError::UsernameTaken` if the username is already registered.
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = validate_registration(username, password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create_local(username, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })
    }

    /// Create the configured admin account unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` if the credentials fail validation.
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<BootstrapOutcome, AuthError> {
        if self.users.get_by_username(username.trim()).await?.is_some() {
            return Ok(BootstrapOutcome::AlreadyExists);
        }

        match self.create_user(username, password).await {
            Ok(user) => Ok(BootstrapOutcome::Created(user)),
            // Another instance bootstrapped concurrently
            Err(AuthError::UsernameTaken) => Ok(BootstrapOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Federated Login
    // =========================================================================

    /// Login with a federated identity token.
    ///
    /// Policy checks run before any database access, so a refused token
    /// never creates an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::FederatedDisabled` if no client ID is configured.
    /// Returns `AuthError::TokenRejected` or `AuthError::InvalidClaims` if the
    /// token does not establish an identity.
    /// Returns `AuthError::DomainNotAllowed` if the email domain is not allowed.
    /// Returns `AuthError::AccountDisabled` if the matching account is inactive.
    #[instrument(skip_all)]
    pub async fn federated_login(&self, id_token: &str) -> Result<Authenticated, AuthError> {
        let client_id = self
            .config
            .google_client_id
            .as_deref()
            .ok_or(AuthError::FederatedDisabled)?;

        if id_token.trim().is_empty() {
            return Err(AuthError::TokenRejected);
        }

        let claims = self.verifier.verify(id_token).await?;
        claims.check(client_id)?;

        // Unverified addresses are neither matched nor trusted for the allow-list
        let email = claims
            .email
            .as_deref()
            .filter(|_| claims.email_verified)
            .and_then(|e| Email::parse(e).ok());

        if !email_domain_allowed(email.as_ref(), &self.config.allowed_email_domains) {
            tracing::warn!(
                domain = email.as_ref().map(Email::domain),
                "Federated login from disallowed domain"
            );
            return Err(AuthError::DomainNotAllowed);
        }

        if let Some(existing) = self
            .users
            .find_by_subject_or_email(&claims.subject, email.as_ref())
            .await?
            && !existing.is_active()
        {
            return Err(AuthError::AccountDisabled);
        }

        let user = self
            .users
            .resolve_federated(&claims.subject, email.as_ref())
            .await?;

        if !user.is_active() {
            return Err(AuthError::AccountDisabled);
        }

        let session = self.sessions.issue(user.id).await?;
        tracing::info!(user_id = %user.id, user = user.display_name(), "Federated login");

        Ok(Authenticated { user, session })
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Revoke the presented session, if any. Never fails.
    pub async fn logout(&self, token: Option<&str>) {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return;
        };

        if let Err(e) = self.sessions.revoke(token).await {
            tracing::warn!(error = %e, "Failed to revoke session on logout");
        }
    }

    /// Resolve a session token to an active user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the lookup fails.
    pub async fn current_user(&self, token: Option<&str>) -> Result<Option<User>, AuthError> {
        Ok(self.sessions.current_user(token).await?)
    }
}

/// Check registration input, returning the trimmed username.
fn validate_registration<'u>(username: &'u str, password: &str) -> Result<&'u str, AuthError> {
    let username = username.trim();

    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "username must be at least {MIN_USERNAME_LENGTH} characters"
        )));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(username)
}

/// Whether `email` passes the domain allow-list. An empty list allows anyone.
fn email_domain_allowed(email: Option<&Email>, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }

    email.is_some_and(|email| allowed.iter().any(|domain| email.has_domain(domain)))
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// An empty or malformed hash never verifies.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
