//! Order routes: customers place and read their own orders, admins list
//! everything and move orders through their statuses.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Router;
use cafe_core::validation::{
    validate_cart_size, validate_id, validate_order_status, validate_phone, validate_price_cents,
    validate_quantity, validate_total_cents,
};
use cafe_core::{Order, Page, ValidationErrors};
use cafe_db::{NewOrderLine, NewSimpleOrder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{AuthAdmin, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::response::{created, message, ok, ApiResponse};
use crate::routes::{non_blank, ApiJson, PageQuery};
use crate::services::checkout::unknown_menu_item;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/my", get(my_orders))
        .route("/{id}", get(get_order).put(update_order_status))
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub menu_item_id: i64,
    pub quantity: i64,
    pub price_cents: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `POST /api/orders`. The total is stored as sent.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub total_amount_cents: i64,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CreateOrderRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_cart_size(self.items.len()));
        for line in &self.items {
            errors.check(validate_id("menu_item_id", line.menu_item_id));
            errors.check(validate_quantity(line.quantity));
            errors.check(validate_price_cents("price_cents", line.price_cents));
        }
        errors.check(validate_total_cents("total_amount_cents", self.total_amount_cents));
        if let Some(phone) = non_blank(&self.phone) {
            errors.check(validate_phone(phone));
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedOrder {
    pub id: i64,
}

/// POST /api/orders
async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> ApiResult<ApiResponse<CreatedOrder>> {
    body.validate()?;

    let order = NewSimpleOrder {
        user_id: user.id,
        lines: body
            .items
            .iter()
            .map(|line| NewOrderLine {
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                price_cents: line.price_cents,
                name_snapshot: non_blank(&line.name).map(str::to_string),
            })
            .collect(),
        total_amount_cents: body.total_amount_cents,
        delivery_address: non_blank(&body.delivery_address).map(str::to_string),
        phone: non_blank(&body.phone).map(str::to_string),
    };

    let id = state
        .db
        .orders()
        .create_simple(&order)
        .await
        .map_err(unknown_menu_item)?;

    info!(order_id = id, user_id = user.id, "Order created");
    Ok(created("Order created successfully", CreatedOrder { id }))
}

/// GET /api/orders/my
async fn my_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<ApiResponse<Vec<Order>>> {
    let orders = state.db.orders().list_for_user(user.id).await?;
    Ok(ok("Orders retrieved successfully", orders))
}

/// GET /api/orders
async fn list_orders(
    State(state): State<Arc<AppState>>,
    _admin: AuthAdmin,
    Query(query): Query<PageQuery>,
) -> ApiResult<ApiResponse<Page<Order>>> {
    let page = state.db.orders().list_all(query.request()).await?;
    Ok(ok("All orders retrieved successfully", page))
}

/// GET /api/orders/{id}
async fn get_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<Order>> {
    let order = state
        .db
        .orders()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    if !user.can_access(order.user_id) {
        return Err(ApiError::Forbidden(
            "Not authorized to view this order".to_string(),
        ));
    }

    Ok(ok("Order retrieved successfully", order))
}

/// PUT /api/orders/{id}
async fn update_order_status(
    State(state): State<Arc<AppState>>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> ApiResult<ApiResponse<()>> {
    let status = validate_order_status(&body.status)?;

    state.db.orders().update_status(id, status).await?;

    info!(order_id = id, status = status.as_str(), admin = %admin.username, "Order status updated");
    Ok(message("Order status updated successfully"))
}
