//! Authentication extractors.
//!
//! Provides extractors for requiring a logged-in staff user in route handlers.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::state::AppState;

use super::session::read_session_token;

/// Extractor that requires a valid session for an active user.
///
/// Rejects with `401` when the cookie is missing, the session is unknown or
/// expired, or the user has been deactivated.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_session_token(&parts.headers);

        let user = state
            .sessions()
            .current_user(token.as_deref())
            .await?
            .ok_or(AppError::Unauthenticated)?;

        set_sentry_user(&user.id, user.username.as_deref());

        Ok(Self(user))
    }
}

/// Extractor for the raw session token, if the request carries one.
pub struct SessionCookie(pub Option<String>);

impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(read_session_token(&parts.headers)))
    }
}
