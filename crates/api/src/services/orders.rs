//! Order workflow: validation, totals and atomic creation.
//!
//! Order creation never touches stock; consuming inventory is a separate,
//! explicit stock adjustment.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use laundry_core::{ErrorKind, OrderId};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::{NewOrder, NewOrderItem, OrderDetail, OrderReceipt, OrderTotals};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("order not found")]
    NotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl OrderError {
    /// Classify this error for callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound => ErrorKind::NotFound,
            Self::Repository(e) => e.kind(),
        }
    }
}

/// Order service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Create an order, its items and its creation event atomically.
    ///
    /// All validation runs before a transaction is opened.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidInput` for an empty item list, a blank
    /// customer name or SKU, a non-positive quantity, a negative price, or
    /// totals that overflow.
    /// Returns `OrderError::Repository` if the transaction fails; nothing is
    /// persisted in that case.
    #[instrument(skip_all, fields(items = order.items.len()))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<OrderReceipt, OrderError> {
        validate_order(order)?;
        let totals = compute_totals(&order.items)?;

        let receipt = self.orders.create_order(order, totals).await?;
        tracing::info!(
            order_id = %receipt.order_id,
            customer_id = %receipt.customer_id,
            total_items = totals.total_items,
            total_price_cents = totals.total_price_cents,
            "Order created"
        );

        Ok(receipt)
    }

    /// Get an order with its items and events.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order doesn't exist.
    pub async fn get_order(&self, id: OrderId) -> Result<OrderDetail, OrderError> {
        self.orders.get_order(id).await?.ok_or(OrderError::NotFound)
    }
}

fn validate_order(order: &NewOrder) -> Result<(), OrderError> {
    if order.items.is_empty() {
        return Err(OrderError::InvalidInput(
            "order must contain at least one item".to_string(),
        ));
    }
    if order.customer.name().is_empty() {
        return Err(OrderError::InvalidInput(
            "customer name must not be empty".to_string(),
        ));
    }

    for (index, item) in order.items.iter().enumerate() {
        if item.sku.trim().is_empty() {
            return Err(OrderError::InvalidInput(format!(
                "item {index}: sku must not be empty"
            )));
        }
        if item.qty <= 0 {
            return Err(OrderError::InvalidInput(format!(
                "item {index}: qty must be positive"
            )));
        }
        if item.unit_price() < 0 {
            return Err(OrderError::InvalidInput(format!(
                "item {index}: unit_price_cents must be non-negative"
            )));
        }
    }

    Ok(())
}

/// Sum quantities and `qty * unit_price_cents` over `items`.
///
/// A missing unit price counts as zero.
///
/// # Errors
///
/// Returns `OrderError::InvalidInput` if either total overflows.
pub fn compute_totals(items: &[NewOrderItem]) -> Result<OrderTotals, OrderError> {
    let overflow = || OrderError::InvalidInput("order totals out of range".to_string());
    let mut totals = OrderTotals::default();

    for item in items {
        let line_price = i64::from(item.qty)
            .checked_mul(item.unit_price())
            .ok_or_else(overflow)?;

        totals.total_items = totals
            .total_items
            .checked_add(item.qty)
            .ok_or_else(overflow)?;
        totals.total_price_cents = totals
            .total_price_cents
            .checked_add(line_price)
            .ok_or_else(overflow)?;
    }

    Ok(totals)
}
