//! Order routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use laundry_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{NewOrder, OrderDetail, OrderReceipt};
use crate::state::AppState;

use super::ApiJson;

/// Create an order.
///
/// POST /api/orders
///
/// # Errors
///
/// Returns 400 for an empty or invalid item list; nothing is written.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(order): ApiJson<NewOrder>,
) -> Result<(StatusCode, Json<OrderReceipt>)> {
    tracing::debug!(user_id = %user.id, "Creating order");
    let receipt = state.orders().create_order(&order).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Show one order with its items and events.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns 404 if the order doesn't exist.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let detail = state.orders().get_order(id).await?;
    Ok(Json(detail))
}
