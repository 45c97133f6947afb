//! Integration tests for order creation.
//!
//! These tests require a `PostgreSQL` database at `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p laundry-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use laundry_api::models::{NewCustomer, NewOrder, NewOrderItem, ORDER_CREATED_BY};
use laundry_api::services::{OrderError, OrderService};
use laundry_core::{ErrorKind, OrderStatus};
use laundry_integration_tests::{test_pool, unique};

fn customer(name: &str, phone: Option<&str>, address: &str) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        phone: phone.map(str::to_string),
        email: None,
        address: Some(address.to_string()),
    }
}

fn item(sku: &str, qty: i32, unit_price_cents: Option<i64>) -> NewOrderItem {
    NewOrderItem {
        sku: sku.to_string(),
        qty,
        description: None,
        unit_price_cents,
    }
}

fn order(customer: NewCustomer, items: Vec<NewOrderItem>) -> NewOrder {
    NewOrder {
        customer,
        items,
        pickup_notes: None,
        delivery_notes: None,
        pickup_at: None,
        delivery_at: None,
    }
}

async fn customer_count(pool: &sqlx::PgPool, name: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ============================================================================
// Totals
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_totals_sum_quantities_and_prices() {
    let pool = test_pool().await;
    let orders = OrderService::new(&pool);
    let name = unique("totals");

    let receipt = orders
        .create_order(&order(
            customer(&name, Some("555-0100"), "1 Main St"),
            vec![
                item("SHIRT", 3, Some(250)),
                item("PANTS", 2, Some(400)),
                // Missing price counts as zero
                item("SOCKS", 5, None),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(receipt.totals.total_items, 10);
    assert_eq!(receipt.totals.total_price_cents, 3 * 250 + 2 * 400);
    assert_eq!(receipt.customer, name);

    let detail = orders.get_order(receipt.order_id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Received);
    assert_eq!(detail.order.totals, receipt.totals);
    assert_eq!(detail.customer_name, name);

    let skus: Vec<_> = detail.items.iter().map(|i| i.sku.as_str()).collect();
    assert_eq!(skus, ["SHIRT", "PANTS", "SOCKS"]);
    assert_eq!(detail.items[2].unit_price_cents, 0);

    assert_eq!(detail.events.len(), 1);
    assert_eq!(detail.events[0].status, OrderStatus::Received);
    assert_eq!(detail.events[0].created_by, ORDER_CREATED_BY);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_empty_order_writes_nothing() {
    let pool = test_pool().await;
    let name = unique("empty");

    let err = OrderService::new(&pool)
        .create_order(&order(customer(&name, None, "2 Main St"), Vec::new()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(customer_count(&pool, &name).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_invalid_item_writes_nothing() {
    let pool = test_pool().await;
    let name = unique("bad_item");

    let err = OrderService::new(&pool)
        .create_order(&order(
            customer(&name, None, "3 Main St"),
            vec![item("SHIRT", 1, Some(100)), item("PANTS", 0, Some(100))],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::InvalidInput(_)));
    assert_eq!(customer_count(&pool, &name).await, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_unknown_order_is_not_found() {
    let pool = test_pool().await;

    let err = OrderService::new(&pool)
        .get_order(laundry_core::OrderId::new(i32::MAX))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ============================================================================
// Customer Upsert
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_repeat_customer_is_updated_not_duplicated() {
    let pool = test_pool().await;
    let orders = OrderService::new(&pool);
    let name = unique("repeat");

    let first = orders
        .create_order(&order(
            customer(&name, Some("555-0101"), "Old Address"),
            vec![item("SHIRT", 1, Some(100))],
        ))
        .await
        .unwrap();
    let second = orders
        .create_order(&order(
            customer(&name, Some("555-0101"), "New Address"),
            vec![item("PANTS", 1, Some(100))],
        ))
        .await
        .unwrap();

    assert_eq!(first.customer_id, second.customer_id);
    assert_ne!(first.order_id, second.order_id);
    assert_eq!(customer_count(&pool, &name).await, 1);

    let address: Option<String> = sqlx::query_scalar("SELECT address FROM customers WHERE id = $1")
        .bind(first.customer_id.as_i32())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(address.as_deref(), Some("New Address"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_phoneless_customer_is_deduplicated() {
    let pool = test_pool().await;
    let orders = OrderService::new(&pool);
    let name = unique("no_phone");

    let first = orders
        .create_order(&order(
            customer(&name, None, "A"),
            vec![item("SHIRT", 1, None)],
        ))
        .await
        .unwrap();
    let second = orders
        .create_order(&order(
            customer(&name, None, "B"),
            vec![item("SHIRT", 1, None)],
        ))
        .await
        .unwrap();

    assert_eq!(first.customer_id, second.customer_id);
    assert_eq!(customer_count(&pool, &name).await, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_customer_key_ignores_surrounding_whitespace() {
    let pool = test_pool().await;
    let orders = OrderService::new(&pool);
    let name = unique("padded");

    let first = orders
        .create_order(&order(
            customer(&name, Some("555-0103"), "A"),
            vec![item("SHIRT", 1, None)],
        ))
        .await
        .unwrap();
    let second = orders
        .create_order(&order(
            customer(&format!("  {name} "), Some(" 555-0103 "), "B"),
            vec![item("SHIRT", 1, None)],
        ))
        .await
        .unwrap();

    assert_eq!(first.customer_id, second.customer_id);
    assert_eq!(second.customer, name);
    assert_eq!(customer_count(&pool, &name).await, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_concurrent_orders_share_one_customer() {
    let pool = test_pool().await;
    let name = unique("concurrent_customer");

    let requests: Vec<_> = (0..8)
        .map(|i| {
            order(
                customer(&name, Some("555-0102"), &format!("Address {i}")),
                vec![item("SHIRT", 1, Some(100))],
            )
        })
        .collect();

    let orders = OrderService::new(&pool);
    let results =
        futures::future::join_all(requests.iter().map(|o| orders.create_order(o))).await;

    let receipts: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    assert!(
        receipts
            .iter()
            .all(|r| r.customer_id == receipts[0].customer_id)
    );
    assert_eq!(customer_count(&pool, &name).await, 1);
}
