//! Order repository: customer upsert, order creation and read-back.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use laundry_core::{CustomerId, OrderEventId, OrderId, OrderItemId, OrderStatus};

use super::RepositoryError;
use crate::models::{
    NewCustomer, NewOrder, NewOrderItem, ORDER_CREATED_BY, ORDER_CREATED_NOTE, Order, OrderDetail,
    OrderEvent, OrderItem, OrderReceipt, OrderTotals,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct InsertedOrderRow {
    id: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    customer_id: i32,
    customer_name: String,
    status: String,
    pickup_notes: Option<String>,
    delivery_notes: Option<String>,
    pickup_at: Option<DateTime<Utc>>,
    delivery_at: Option<DateTime<Utc>>,
    total_items: i32,
    total_price_cents: i64,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<(Order, String), RepositoryError> {
        let status = parse_status(&self.status)?;
        let order = Order {
            id: OrderId::new(self.id),
            customer_id: CustomerId::new(self.customer_id),
            status,
            pickup_notes: self.pickup_notes,
            delivery_notes: self.delivery_notes,
            pickup_at: self.pickup_at,
            delivery_at: self.delivery_at,
            totals: OrderTotals {
                total_items: self.total_items,
                total_price_cents: self.total_price_cents,
            },
            created_at: self.created_at,
        };
        Ok((order, self.customer_name))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    sku: String,
    description: Option<String>,
    qty: i32,
    unit_price_cents: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            sku: row.sku,
            description: row.description,
            qty: row.qty,
            unit_price_cents: row.unit_price_cents,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderEventRow {
    id: i32,
    order_id: i32,
    status: String,
    note: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderEventRow> for OrderEvent {
    type Error = RepositoryError;

    fn try_from(row: OrderEventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderEventId::new(row.id),
            order_id: OrderId::new(row.order_id),
            status: parse_status(&row.status)?,
            note: row.note,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

fn parse_status(s: &str) -> Result<OrderStatus, RepositoryError> {
    s.parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order with its customer, items and creation event.
    ///
    /// Runs as a single transaction: the customer upsert, the order row, every
    /// line item (in submission order), the `received` event and the final
    /// totals either all commit or none do. `totals` must already be derived
    /// from `order.items`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back when it is dropped uncommitted.
    pub async fn create_order(
        &self,
        order: &NewOrder,
        totals: OrderTotals,
    ) -> Result<OrderReceipt, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let customer_id = upsert_customer(&mut tx, &order.customer).await?;

        let inserted = sqlx::query_as::<_, InsertedOrderRow>(
            r"
            INSERT INTO orders (customer_id, status, pickup_notes, delivery_notes,
                                pickup_at, delivery_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            ",
        )
        .bind(customer_id.as_i32())
        .bind(OrderStatus::Received.as_str())
        .bind(order.pickup_notes.as_deref())
        .bind(order.delivery_notes.as_deref())
        .bind(order.pickup_at)
        .bind(order.delivery_at)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            insert_item(&mut tx, inserted.id, item).await?;
        }

        sqlx::query(
            r"
            INSERT INTO order_events (order_id, status, note, created_by)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(inserted.id)
        .bind(OrderStatus::Received.as_str())
        .bind(ORDER_CREATED_NOTE)
        .bind(ORDER_CREATED_BY)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE orders
            SET total_items = $2, total_price_cents = $3
            WHERE id = $1
            ",
        )
        .bind(inserted.id)
        .bind(totals.total_items)
        .bind(totals.total_price_cents)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(OrderReceipt {
            order_id: OrderId::new(inserted.id),
            customer_id,
            customer: order.customer.name().to_owned(),
            totals,
            created_at: inserted.created_at,
        })
    }

    /// Get an order with its customer name, items and events.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` for unknown stored statuses.
    pub async fn get_order(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT o.id, o.customer_id, c.name AS customer_name, o.status,
                   o.pickup_notes, o.delivery_notes, o.pickup_at, o.delivery_at,
                   o.total_items, o.total_price_cents, o.created_at
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE o.id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let (order, customer_name) = row.into_order()?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, sku, description, qty, unit_price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let events = sqlx::query_as::<_, OrderEventRow>(
            r"
            SELECT id, order_id, status, note, created_by, created_at
            FROM order_events
            WHERE order_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderDetail {
            order,
            customer_name,
            items: items.into_iter().map(Into::into).collect(),
            events: events
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
        }))
    }
}

/// Insert or refresh a customer by `(name, phone)`, returning its ID.
async fn upsert_customer(
    tx: &mut Transaction<'_, Postgres>,
    customer: &NewCustomer,
) -> Result<CustomerId, RepositoryError> {
    let id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO customers (name, phone, email, address)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT ON CONSTRAINT uq_customers_name_phone
        DO UPDATE SET email = EXCLUDED.email, address = EXCLUDED.address
        RETURNING id
        ",
    )
    .bind(customer.name())
    .bind(customer.phone())
    .bind(customer.email.as_deref())
    .bind(customer.address.as_deref())
    .fetch_one(&mut **tx)
    .await?;

    Ok(CustomerId::new(id))
}

async fn insert_item(
    tx: &mut Transaction<'_, Postgres>,
    order_id: i32,
    item: &NewOrderItem,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO order_items (order_id, sku, description, qty, unit_price_cents)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(order_id)
    .bind(&item.sku)
    .bind(item.description.as_deref())
    .bind(item.qty)
    .bind(item.unit_price())
    .execute(&mut **tx)
    .await?;

    Ok(())
}
