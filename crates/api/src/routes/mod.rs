//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /healthz                - Readiness (503 when the database is down)
//! GET  /api/hello              - Greeting
//!
//! # Auth
//! POST /api/auth/register      - Register a local account (sets cookie)
//! POST /api/auth/login         - Password login (sets cookie)
//! POST /api/auth/google        - Federated login (sets cookie)
//! POST /api/auth/logout        - Logout (clears cookie)
//! GET  /api/auth/me            - Current user
//!
//! # Orders (requires auth)
//! POST /api/orders             - Create order
//! GET  /api/orders/{id}        - Order detail
//!
//! # Inventory (requires auth)
//! GET  /api/product-types      - Catalog with stock
//! POST /api/product-types      - Create product type
//! GET  /api/stock              - Stock levels
//! POST /api/stock/add          - Add stock
//! POST /api/stock/subtract     - Subtract stock
//! ```

pub mod auth;
pub mod health;
pub mod inventory;
pub mod orders;

use axum::{
    Router,
    extract::FromRequest,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections use the standard error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/google", post(auth::google))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(orders::create))
        .route("/api/orders/{id}", get(orders::show))
}

/// Create the inventory routes router.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/product-types",
            get(inventory::list_product_types).post(inventory::create_product_type),
        )
        .route("/api/stock", get(inventory::list_stock))
        .route("/api/stock/add", post(inventory::add_stock))
        .route("/api/stock/subtract", post(inventory::subtract_stock))
}

/// Build all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/healthz", get(health::readiness))
        .route("/api/hello", get(health::hello))
        .nest("/api/auth", auth_routes())
        .merge(order_routes())
        .merge(inventory_routes())
}
