//! Authentication error types.

use thiserror::Error;

use laundry_core::ErrorKind;

use crate::db::RepositoryError;
use crate::services::identity::{ClaimsError, VerifyError};
use crate::services::sessions::SessionError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// Invalid credentials (wrong password, unknown or inactive user).
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Username already exists.
    #[error("username already exists")]
    UsernameTaken,

    /// Federated login is not configured on this server.
    #[error("federated login is not configured")]
    FederatedDisabled,

    /// The identity assertion was refused by the provider.
    #[error("identity token rejected")]
    TokenRejected,

    /// The identity assertion failed issuer/audience/subject policy.
    #[error("invalid identity token: {0}")]
    InvalidClaims(#[from] ClaimsError),

    /// The asserted email is outside the allowed domains.
    #[error("email domain is not allowed")]
    DomainNotAllowed,

    /// The account exists but has been deactivated.
    #[error("account is disabled")]
    AccountDisabled,

    /// The identity provider could not be reached.
    #[error("identity provider unavailable: {0}")]
    IdentityProvider(reqwest::Error),

    /// Session error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Classify this error for callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidCredentials
            | Self::FederatedDisabled
            | Self::TokenRejected
            | Self::InvalidClaims(_) => ErrorKind::Unauthorized,
            Self::DomainNotAllowed | Self::AccountDisabled => ErrorKind::Forbidden,
            Self::UsernameTaken => ErrorKind::Conflict,
            Self::IdentityProvider(_) => ErrorKind::Unavailable,
            Self::Session(e) => e.kind(),
            Self::Repository(e) => e.kind(),
            Self::PasswordHash => ErrorKind::Internal,
        }
    }
}

impl From<VerifyError> for AuthError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Rejected(_) => Self::TokenRejected,
            VerifyError::Transport(e) => Self::IdentityProvider(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            AuthError::InvalidInput("short".to_string()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(AuthError::InvalidCredentials.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::TokenRejected.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            AuthError::InvalidClaims(ClaimsError::AudienceMismatch).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(AuthError::DomainNotAllowed.kind(), ErrorKind::Forbidden);
        assert_eq!(AuthError::AccountDisabled.kind(), ErrorKind::Forbidden);
        assert_eq!(AuthError::UsernameTaken.kind(), ErrorKind::Conflict);
        assert_eq!(AuthError::PasswordHash.kind(), ErrorKind::Internal);
        assert_eq!(
            AuthError::Repository(RepositoryError::Database(sqlx::Error::PoolTimedOut)).kind(),
            ErrorKind::Unavailable
        );
    }

    #[test]
    fn test_rejected_token_maps_to_unauthorized() {
        let err: AuthError = VerifyError::Rejected("expired".to_string()).into();
        assert!(matches!(err, AuthError::TokenRejected));
    }
}
