//! Integration tests driving the full router with session cookies.
//!
//! These tests require a `PostgreSQL` database at `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p laundry-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;

use laundry_api::config::ApiConfig;
use laundry_api::state::AppState;
use laundry_integration_tests::{test_pool, unique};

async fn test_app() -> Router {
    let url = std::env::var("TEST_DATABASE_URL").unwrap();
    let config = ApiConfig::from_lookup(|key| match key {
        "LAUNDRY_DATABASE_URL" => Some(url.clone()),
        _ => None,
    })
    .unwrap();
    let pool = test_pool().await;

    laundry_api::app(AppState::new(config, pool).unwrap()).unwrap()
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `name=value` pair from the response's `Set-Cookie` header.
fn session_pair(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_session_cookie_lifecycle() {
    let app = test_app().await;
    let username = unique("http_user");
    let credentials = json!({ "username": username, "password": "secret1" });

    let response = send(&app, json_request("POST", "/api/auth/register", None, &credentials)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_pair(&response);
    assert!(cookie.starts_with("session="));

    let response = send(&app, get("/api/auth/me", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], username.as_str());

    let response = send(&app, json_request("POST", "/api/auth/register", None, &credentials)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "conflict");

    let response = send(&app, json_request("POST", "/api/auth/logout", Some(&cookie), &json!({}))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, get("/api/auth/me", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, json_request("POST", "/api/auth/login", None, &credentials)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fresh = session_pair(&response);
    assert_ne!(fresh, cookie);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_order_and_stock_endpoints() {
    let app = test_app().await;
    let credentials = json!({ "username": unique("http_staff"), "password": "secret1" });
    let response = send(&app, json_request("POST", "/api/auth/register", None, &credentials)).await;
    let cookie = session_pair(&response);
    let cookie = Some(cookie.as_str());

    // Catalog and stock
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/product-types",
            cookie,
            &json!({ "description": unique("Wash & Fold"), "unit_price_cents": 500 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product_id = body_json(response).await["id"].clone();

    let adjust = |qty: i32| json!({ "product_type_id": product_id, "quantity": qty });

    let response = send(&app, json_request("POST", "/api/stock/add", cookie, &adjust(20))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, json_request("POST", "/api/stock/subtract", cookie, &adjust(5))).await;
    assert_eq!(body_json(response).await["available_quantity"], 15);

    let response = send(&app, json_request("POST", "/api/stock/subtract", cookie, &adjust(100))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_input");

    let response = send(&app, get("/api/stock", cookie)).await;
    let stock = body_json(response).await;
    let row = stock
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["product_type_id"] == product_id)
        .unwrap();
    assert_eq!(row["available_quantity"], 15);

    // Orders
    let order = json!({
        "customer": { "name": unique("http_customer"), "phone": "555-0199" },
        "items": [
            { "sku": "SHIRT", "qty": 2, "unit_price_cents": 300 },
            { "sku": "TOWEL", "qty": 1 }
        ]
    });
    let response = send(&app, json_request("POST", "/api/orders", cookie, &order)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let receipt = body_json(response).await;
    assert_eq!(receipt["ok"], true);
    assert_eq!(receipt["items"], 3);
    assert_eq!(receipt["total_price_cents"], 600);

    let order_id = receipt["order_id"].as_i64().unwrap();
    let response = send(&app, get(&format!("/api/orders/{order_id}"), cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["items"].as_array().unwrap().len(), 2);

    let response = send(
        &app,
        json_request("POST", "/api/orders", cookie, &json!({ "customer": { "name": "x" }, "items": [] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
