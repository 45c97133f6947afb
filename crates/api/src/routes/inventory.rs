//! Product catalog and stock routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use laundry_core::ProductTypeId;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{ProductType, ProductTypeWithStock, Stock, StockEntry};
use crate::state::AppState;

use super::ApiJson;

/// Payload for creating a product type.
#[derive(Debug, Deserialize)]
pub struct NewProductTypeRequest {
    pub description: String,
    pub unit_price_cents: i64,
}

/// Payload for a stock adjustment.
#[derive(Debug, Deserialize)]
pub struct StockAdjustmentRequest {
    pub product_type_id: ProductTypeId,
    pub quantity: i32,
}

/// List product types with stock, newest first.
///
/// GET /api/product-types
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn list_product_types(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
) -> Result<Json<Vec<ProductTypeWithStock>>> {
    Ok(Json(state.inventory().list_product_types().await?))
}

/// Create a product type.
///
/// POST /api/product-types
///
/// # Errors
///
/// Returns 400 for a negative price or blank description.
pub async fn create_product_type(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    ApiJson(req): ApiJson<NewProductTypeRequest>,
) -> Result<(StatusCode, Json<ProductType>)> {
    let product = state
        .inventory()
        .create_product_type(&req.description, req.unit_price_cents)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// List stock, most recently updated first.
///
/// GET /api/stock
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn list_stock(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
) -> Result<Json<Vec<StockEntry>>> {
    Ok(Json(state.inventory().list_stock().await?))
}

/// Add stock.
///
/// POST /api/stock/add
///
/// # Errors
///
/// Returns 400 for a non-positive quantity and 404 for an unknown product.
pub async fn add_stock(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    ApiJson(req): ApiJson<StockAdjustmentRequest>,
) -> Result<Json<Stock>> {
    let stock = state
        .inventory()
        .add_stock(req.product_type_id, req.quantity)
        .await?;
    Ok(Json(stock))
}

/// Subtract stock.
///
/// POST /api/stock/subtract
///
/// # Errors
///
/// Returns 400 for a non-positive quantity or insufficient stock and 404 when
/// the product has no stock row.
pub async fn subtract_stock(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    ApiJson(req): ApiJson<StockAdjustmentRequest>,
) -> Result<Json<Stock>> {
    let stock = state
        .inventory()
        .subtract_stock(req.product_type_id, req.quantity)
        .await?;
    Ok(Json(stock))
}
