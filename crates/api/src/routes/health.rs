//! Health and greeting endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::db;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match db::ping(state.pool()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

/// Greeting used by the frontend to check connectivity.
pub async fn hello() -> Json<Value> {
    Json(json!({ "ok": true, "msg": "Laundry API up!" }))
}
