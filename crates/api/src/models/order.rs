//! Order domain models: customers, orders, line items and status events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laundry_core::{CustomerId, OrderEventId, OrderId, OrderItemId, OrderStatus};

/// Note attached to the event written when an order is created.
pub const ORDER_CREATED_NOTE: &str = "Order created via API";

/// Actor recorded on the creation event.
pub const ORDER_CREATED_BY: &str = "api";

// =============================================================================
// Inputs
// =============================================================================

/// Customer details submitted with an order.
///
/// `(name, phone)` is the natural key; resubmitting it updates email and
/// address on the existing customer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewCustomer {
    /// Trimmed name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.trim()
    }

    /// Trimmed phone; a blank phone counts as absent.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// A line item submitted with an order.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    pub sku: String,
    pub qty: i32,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in cents; a missing price counts as zero.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

impl NewOrderItem {
    /// Unit price with the zero default applied.
    #[must_use]
    pub fn unit_price(&self) -> i64 {
        self.unit_price_cents.unwrap_or(0)
    }
}

/// Everything needed to create an order in one transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub customer: NewCustomer,
    pub items: Vec<NewOrderItem>,
    #[serde(default)]
    pub pickup_notes: Option<String>,
    #[serde(default)]
    pub delivery_notes: Option<String>,
    #[serde(default)]
    pub pickup_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivery_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Outputs
// =============================================================================

/// Aggregates derived from an order's line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OrderTotals {
    /// Sum of line item quantities.
    pub total_items: i32,
    /// Sum of `qty * unit_price_cents`.
    pub total_price_cents: i64,
}

/// Result of a successful order creation.
///
/// Serializes as `{ok, order_id, customer_id, customer, items,
/// total_price_cents, created_at}`, where `items` is the total quantity.
#[derive(Debug, Clone, Serialize)]
#[serde(into = "ReceiptBody")]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    /// Customer name as stored.
    pub customer: String,
    pub totals: OrderTotals,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ReceiptBody {
    ok: bool,
    order_id: OrderId,
    customer_id: CustomerId,
    customer: String,
    items: i32,
    total_price_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<OrderReceipt> for ReceiptBody {
    fn from(receipt: OrderReceipt) -> Self {
        Self {
            ok: true,
            order_id: receipt.order_id,
            customer_id: receipt.customer_id,
            customer: receipt.customer,
            items: receipt.totals.total_items,
            total_price_cents: receipt.totals.total_price_cents,
            created_at: receipt.created_at,
        }
    }
}

/// A stored order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub pickup_notes: Option<String>,
    pub delivery_notes: Option<String>,
    pub pickup_at: Option<DateTime<Utc>>,
    pub delivery_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub created_at: DateTime<Utc>,
}

/// A stored line item.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub sku: String,
    pub description: Option<String>,
    pub qty: i32,
    pub unit_price_cents: i64,
}

/// An entry in an order's status history.
#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub id: OrderEventId,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub note: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// An order with its customer name, items (insertion order) and events.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub customer_name: String,
    pub items: Vec<OrderItem>,
    pub events: Vec<OrderEvent>,
}
