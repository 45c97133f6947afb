//! Authentication routes.
//!
//! Every successful login path answers with the user and sets the session
//! cookie. Logout always clears the cookie.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::{
    RequireUser, SessionCookie, removal_cookie, session_cookie, set_cookie_header,
};
use crate::models::User;
use crate::services::Authenticated;
use crate::state::AppState;

use super::ApiJson;

/// Username/password payload for login and registration.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Federated login payload.
#[derive(Debug, Deserialize)]
pub struct FederatedRequest {
    pub id_token: String,
}

/// Response for a successful login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// Attach the session cookie to an authentication result.
fn with_session(
    state: &AppState,
    status: StatusCode,
    authenticated: Authenticated,
) -> Result<Response> {
    let cookie = session_cookie(&authenticated.session.token, &state.config().auth);
    let headers = set_cookie_header(&cookie)?;
    let body = AuthResponse {
        user: authenticated.user,
        expires_at: authenticated.session.expires_at,
    };

    Ok((status, headers, Json(body)).into_response())
}

/// Register a local account.
///
/// POST /api/auth/register
///
/// # Errors
///
/// Returns 400 for a short username or password, 409 if the name is taken.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<Response> {
    let authenticated = state.auth().register(&req.username, &req.password).await?;
    with_session(&state, StatusCode::CREATED, authenticated)
}

/// Log in with username and password.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 for unknown users, wrong passwords and inactive accounts.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<Response> {
    let authenticated = state.auth().login(&req.username, &req.password).await?;
    with_session(&state, StatusCode::OK, authenticated)
}

/// Log in with a Google ID token.
///
/// POST /api/auth/google
///
/// # Errors
///
/// Returns 401 if the token does not establish an identity and 403 if the
/// domain is not allowed or the account is disabled.
pub async fn google(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<FederatedRequest>,
) -> Result<Response> {
    let authenticated = state.auth().federated_login(&req.id_token).await?;
    with_session(&state, StatusCode::OK, authenticated)
}

/// Log out.
///
/// POST /api/auth/logout
///
/// Always answers 204 and clears the cookie, whether or not a session was
/// found or could be revoked.
pub async fn logout(State(state): State<AppState>, SessionCookie(token): SessionCookie) -> Response {
    state.auth().logout(token.as_deref()).await;

    match set_cookie_header(&removal_cookie(&state.config().auth)) {
        Ok(headers) => (StatusCode::NO_CONTENT, headers).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build removal cookie");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// Current user.
///
/// GET /api/auth/me
pub async fn me(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}
