//! Inventory domain models: product catalog and stock levels.

use chrono::{DateTime, Utc};
use serde::Serialize;

use laundry_core::{ProductTypeId, StockId};

/// A catalog entry for a service product (e.g. "Wash & Fold").
#[derive(Debug, Clone, Serialize)]
pub struct ProductType {
    pub id: ProductTypeId,
    pub description: String,
    pub unit_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// A product type with its current stock level.
///
/// Quantity defaults to 0 and the timestamp to the product's creation time
/// when no stock row exists yet.
#[derive(Debug, Clone, Serialize)]
pub struct ProductTypeWithStock {
    #[serde(flatten)]
    pub product: ProductType,
    pub available_quantity: i32,
    pub stock_updated_at: DateTime<Utc>,
}

/// The stock row of one product type.
#[derive(Debug, Clone, Serialize)]
pub struct Stock {
    pub id: StockId,
    pub product_type_id: ProductTypeId,
    pub available_quantity: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A stock row joined with its product description.
#[derive(Debug, Clone, Serialize)]
pub struct StockEntry {
    #[serde(flatten)]
    pub stock: Stock,
    pub description: String,
}
