//! Router-level tests: requests go through the full axum stack (extractors,
//! error envelope, layers) against an in-memory database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use cafe_api::{build_router, ApiConfig, AppEnv, AppState};
use cafe_core::{OrderStatus, Role};
use cafe_db::{Database, DbConfig, NewMenuItem};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

// =============================================================================
// Helpers
// =============================================================================

async fn setup() -> (Router, Arc<AppState>) {
    setup_with(ApiConfig::for_tests()).await
}

async fn setup_with(config: ApiConfig) -> (Router, Arc<AppState>) {
    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database");
    let state = Arc::new(AppState::new(db, config));
    (build_router(state.clone()), state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn menu_item(state: &AppState, name: &str, price_cents: i64) -> i64 {
    state
        .db
        .menu()
        .create(&NewMenuItem {
            name: name.to_string(),
            category_id: None,
            description: None,
            price_cents,
            image: None,
        })
        .await
        .unwrap()
        .id
}

/// Registers a customer and returns (user id, token).
async fn register(app: &Router, email: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Asha Rao", "email": email, "password": "chai1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let id = body["data"]["user"]["id"].as_i64().unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();
    (id, token)
}

fn admin_token(state: &AppState) -> String {
    state.admin_tokens.issue_admin(1, "manager").unwrap()
}

fn checkout_body(menu_item_id: i64, payment_method: &str) -> Value {
    json!({
        "customer_name": "Asha Rao",
        "email": "asha@kube.cafe",
        "phone": "9876543210",
        "order_type": "delivery",
        "delivery_address": "12 MG Road, Bengaluru",
        "items": [
            { "menu_item_id": menu_item_id, "name": "Cold Coffee", "quantity": 2, "price_cents": 5000 }
        ],
        "payment_method": payment_method,
        // Ignored: the server prices the cart itself.
        "final_amount_cents": 1
    })
}

async fn order_counts(state: &AppState) -> (i64, i64) {
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(state.db.pool())
        .await
        .unwrap();
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
        .fetch_one(state.db.pool())
        .await
        .unwrap();
    (orders, items)
}

// =============================================================================
// Health & Auth
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

/// Closing the pool turns the health check into a 500.
async fn server_error_body(app_env: AppEnv) -> Value {
    let mut config = ApiConfig::for_tests();
    config.app_env = app_env;
    let (app, state) = setup_with(config).await;
    state.db.close().await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Server error");
    body
}

#[tokio::test]
async fn test_server_error_detail_only_in_development() {
    let body = server_error_body(AppEnv::Development).await;
    assert_eq!(body["error"], "database health check failed");

    let body = server_error_body(AppEnv::Production).await;
    assert!(body.get("error").is_none(), "{body}");
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let (app, _) = setup().await;
    register(&app, "dup@kube.cafe").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Asha Rao", "email": "dup@kube.cafe", "password": "chai1234" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn test_register_validation_lists_fields() {
    let (app, _) = setup().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "A", "email": "nope", "password": "123" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "email", "password"]);
}

#[tokio::test]
async fn test_login() {
    let (app, _) = setup().await;
    register(&app, "login@kube.cafe").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "login@kube.cafe", "password": "chai1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("password_hash").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "login@kube.cafe", "password": "wrong-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_admin_login() {
    let (app, state) = setup().await;
    state
        .db
        .admins()
        .create(&cafe_db::NewAdmin {
            username: "manager".to_string(),
            email: Some("manager@kube.cafe".to_string()),
            password_hash: cafe_api::auth::hash_password("espresso").unwrap(),
        })
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/login",
        None,
        Some(json!({ "username": "manager", "password": "espresso" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Admin login successful");
    assert_eq!(body["data"]["admin"]["username"], "manager");

    // The admin token opens the dashboard.
    let token = body["data"]["token"].as_str().unwrap();
    let (status, body) = send(&app, Method::GET, "/api/admin/dashboard", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stats"]["totalOrders"], 0);
    assert!(body["data"]["recentOrders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_user_token_cannot_open_admin_routes() {
    let (app, _) = setup().await;
    let (_, user_token) = register(&app, "nosy@kube.cafe").await;

    let (status, body) =
        send(&app, Method::GET, "/api/admin/dashboard", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, admin token failed");
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_prices_cart_server_side() {
    let (app, state) = setup().await;
    let item_id = menu_item(&state, "Cold Coffee", 5_000).await;
    let (_, token) = register(&app, "buyer@kube.cafe").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(&token),
        Some(checkout_body(item_id, "cod")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Order placed successfully");
    let receipt = &body["data"];
    assert_eq!(receipt["finalAmountCents"], 14_500);
    assert_eq!(receipt["paymentStatus"], "pending");
    assert_eq!(receipt["status"], "preparing");
    assert!(receipt["pickupTime"].is_null());
    assert!(receipt["displayOrderId"].as_str().unwrap().starts_with("KK-"));

    assert_eq!(order_counts(&state).await, (1, 1));

    let order_id = receipt["orderId"].as_i64().unwrap();
    let order = state.db.orders().get(order_id).await.unwrap().unwrap();
    assert_eq!(order.total_amount_cents, 14_500);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].name_snapshot.as_deref(), Some("Cold Coffee"));
}

#[tokio::test]
async fn test_checkout_card_is_paid() {
    let (app, state) = setup().await;
    let item_id = menu_item(&state, "Cold Coffee", 5_000).await;
    let (_, token) = register(&app, "card@kube.cafe").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(&token),
        Some(checkout_body(item_id, "card")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["paymentStatus"], "paid");
}

#[tokio::test]
async fn test_checkout_unknown_item_writes_nothing() {
    let (app, state) = setup().await;
    let (_, token) = register(&app, "ghost@kube.cafe").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkout",
        Some(&token),
        Some(checkout_body(9_999, "upi")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "items");
    assert_eq!(order_counts(&state).await, (0, 0));
}

#[tokio::test]
async fn test_checkout_rejects_overflowing_price() {
    let (app, state) = setup().await;
    let item_id = menu_item(&state, "Cold Coffee", 5_000).await;
    let (_, token) = register(&app, "whale@kube.cafe").await;

    let mut body = checkout_body(item_id, "card");
    body["items"][0]["price_cents"] = json!(4_611_686_018_427_387_903_i64);
    body["items"][0]["quantity"] = json!(3);

    let (status, body) = send(&app, Method::POST, "/api/checkout", Some(&token), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "price_cents");
    assert_eq!(order_counts(&state).await, (0, 0));
}

#[tokio::test]
async fn test_checkout_requires_token() {
    let (app, state) = setup().await;
    let item_id = menu_item(&state, "Cold Coffee", 5_000).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/checkout",
        None,
        Some(checkout_body(item_id, "cod")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");
    assert_eq!(order_counts(&state).await, (0, 0));
}

// =============================================================================
// Orders
// =============================================================================

async fn placed_order(app: &Router, state: &AppState, token: &str) -> i64 {
    let item_id = menu_item(state, "Masala Chai", 5_000).await;
    let (status, body) = send(
        app,
        Method::POST,
        "/api/checkout",
        Some(token),
        Some(checkout_body(item_id, "cod")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["orderId"].as_i64().unwrap()
}

#[tokio::test]
async fn test_status_update_requires_admin_token() {
    let (app, state) = setup().await;
    let (_, user_token) = register(&app, "owner@kube.cafe").await;
    let order_id = placed_order(&app, &state, &user_token).await;
    let uri = format!("/api/orders/{order_id}");
    let ready = json!({ "status": "ready" });

    let (status, body) = send(&app, Method::PUT, &uri, None, Some(ready.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");

    let (status, _) = send(&app, Method::PUT, &uri, Some("garbage"), Some(ready.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::PUT, &uri, Some(&user_token), Some(ready.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let order = state.db.orders().get(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Preparing);

    let admin = admin_token(&state);
    let (status, body) = send(&app, Method::PUT, &uri, Some(&admin), Some(ready)).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let order = state.db.orders().get(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Ready);
}

#[tokio::test]
async fn test_status_update_rejects_bad_status_and_missing_order() {
    let (app, state) = setup().await;
    let admin = admin_token(&state);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/orders/42",
        Some(&admin),
        Some(json!({ "status": "teleported" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "status");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/orders/42",
        Some(&admin),
        Some(json!({ "status": "ready" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found");
}

#[tokio::test]
async fn test_order_visible_to_owner_only() {
    let (app, state) = setup().await;
    let (_, owner) = register(&app, "mine@kube.cafe").await;
    let (other_id, other) = register(&app, "theirs@kube.cafe").await;
    let order_id = placed_order(&app, &state, &owner).await;
    let uri = format!("/api/orders/{order_id}");

    let (status, body) = send(&app, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin-role customers may look at any order.
    let staff = state.user_tokens.issue_user(other_id, Role::Admin).unwrap();
    let (status, _) = send(&app, Method::GET, &uri, Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/orders/my", Some(&other), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_simple_order_and_admin_listing() {
    let (app, state) = setup().await;
    let item_id = menu_item(&state, "Paneer Puff", 7_000).await;
    let (_, token) = register(&app, "simple@kube.cafe").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(json!({
            "items": [{ "menu_item_id": item_id, "quantity": 3, "price_cents": 7000 }],
            "total_amount_cents": 21000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let admin = admin_token(&state);
    let (status, body) =
        send(&app, Method::GET, "/api/orders?page=1&limit=5", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["pagination"]["totalPages"], 1);
    let order = &body["data"]["items"][0];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["user_email"], "simple@kube.cafe");
    assert_eq!(order["items"][0]["quantity"], 3);
}

// =============================================================================
// Menu
// =============================================================================

fn multipart_body(boundary: &str, fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    body
}

#[tokio::test]
async fn test_menu_create_and_list() {
    let (app, state) = setup().await;
    let admin = admin_token(&state);
    let boundary = "cafe-boundary";

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/menu")
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body(
            boundary,
            &[("name", "Masala Chai"), ("price_cents", "5000")],
        )))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, "/api/menu", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Masala Chai");
    assert_eq!(items[0]["price_cents"], 5_000);

    let (status, body) = send(&app, Method::GET, "/api/menu?page=1&limit=10", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_menu_writes_need_admin() {
    let (app, _) = setup().await;
    let (status, _) = send(&app, Method::DELETE, "/api/menu/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_menu_delete() {
    let (app, state) = setup().await;
    let admin = admin_token(&state);
    let item_id = menu_item(&state, "Brownie", 11_000).await;
    let uri = format!("/api/menu/{item_id}");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Menu item not found");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_menu_item_in_orders_cannot_be_deleted() {
    let (app, state) = setup().await;
    let (_, token) = register(&app, "regular@kube.cafe").await;
    placed_order(&app, &state, &token).await;

    let item_id = state.db.menu().list_all().await.unwrap()[0].id;
    let admin = admin_token(&state);
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/menu/{item_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_admin_user_management() {
    let (app, state) = setup().await;
    let admin = admin_token(&state);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(&admin),
        Some(json!({ "name": "Ravi K", "email": "ravi@kube.cafe", "password": "filter99" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/users/{id}"),
        Some(&admin),
        Some(json!({ "name": "Ravi Kumar", "email": "ravi@kube.cafe", "phone": "9876543210" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ravi Kumar");

    let (status, body) = send(&app, Method::GET, "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let uri = format!("/api/users/{id}");
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}
