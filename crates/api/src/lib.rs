//! Laundry API library.
//!
//! Order management, inventory and staff authentication for a laundry
//! service, exposed as a library so the binary, the CLI and the integration
//! tests share one implementation.
//!
//! # Layers
//!
//! - [`db`] - Repositories over `PostgreSQL`
//! - [`services`] - Transactional business operations
//! - [`routes`], [`middleware`], [`error`] - Thin HTTP adapter

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod tasks;

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, Request, Response, header::CONTENT_TYPE},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::state::AppState;

/// Build the application router with tracing and CORS layers.
///
/// Sentry layers are added by the binary, outermost.
///
/// # Errors
///
/// Returns `AppError::Internal` if the configured CORS origin is not a valid
/// header value.
pub fn app(state: AppState) -> Result<Router, AppError> {
    let origin = HeaderValue::from_str(&state.config().cors_origin)
        .map_err(|e| AppError::Internal(format!("invalid CORS origin: {e}")))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
            span.record("status", response.status().as_u16());
            span.record(
                "latency_ms",
                u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            );
            DefaultOnResponse::default().on_response(response, latency, span);
        });

    Ok(routes::routes().layer(trace).layer(cors).with_state(state))
}
