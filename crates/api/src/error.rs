//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. The response status comes from
//! the error's [`ErrorKind`] and the body is always
//! `{"error": "<kind>", "message": "<text>"}`. Server faults are logged and
//! captured to Sentry, and their message is replaced with an opaque one.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use laundry_core::ErrorKind;

use crate::db::RepositoryError;
use crate::services::{AuthError, InventoryError, OrderError, SessionError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session lookup failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Inventory operation failed.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// No valid session was presented.
    #[error("authentication required")]
    Unauthenticated,

    /// Request body could not be parsed.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: ErrorKind,
    message: &'a str,
}

impl AppError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(e) => e.kind(),
            Self::Session(e) => e.kind(),
            Self::Inventory(e) => e.kind(),
            Self::Order(e) => e.kind(),
            Self::Database(e) => e.kind(),
            Self::Unauthenticated => ErrorKind::Unauthorized,
            Self::BadRequest(_) => ErrorKind::InvalidInput,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to show to the caller.
    fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            ErrorKind::Unavailable => "Service temporarily unavailable".to_string(),
            _ => match self {
                Self::Auth(e) => e.to_string(),
                Self::Inventory(e) => e.to_string(),
                Self::Order(e) => e.to_string(),
                Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
                Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
                other => other.to_string(),
            },
        }
    }
}

/// HTTP status for an error kind.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        // Capture server errors to Sentry
        if kind.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                kind = %kind,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, kind = %kind, "Request rejected");
        }

        // Don't expose internal error details to clients
        let message = self.public_message();
        let body = ErrorBody {
            error: kind,
            message: &message,
        };

        (status_for(kind), Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated user.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_for_every_kind() {
        assert_eq!(status_for(ErrorKind::InvalidInput), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(
            status_for(ErrorKind::Unavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(ErrorKind::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_client_error_body_carries_message() {
        let response = AppError::Inventory(InventoryError::InsufficientStock {
            available: 15,
            requested: 100,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid_input");
        assert_eq!(
            body["message"],
            "insufficient stock: 15 available, 100 requested"
        );
    }

    #[tokio::test]
    async fn test_conflict_and_forbidden() {
        let response = AppError::Auth(AuthError::UsernameTaken).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::Auth(AuthError::DomainNotAllowed).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "forbidden");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Internal("secret connection string".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "internal");
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable() {
        let response =
            AppError::Database(RepositoryError::Database(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["error"], "unavailable");
        assert_eq!(body["message"], "Service temporarily unavailable");
    }

    #[tokio::test]
    async fn test_unauthenticated() {
        let response = AppError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "authentication required");
    }
}
