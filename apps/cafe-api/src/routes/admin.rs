//! Back-office login and overview pages.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::Router;
use cafe_core::validation::validate_required;
use cafe_core::{Admin, Order, Page, User, ValidationErrors};
use cafe_db::DashboardStats;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{verify_password, AuthAdmin, INVALID_CREDENTIALS};
use crate::error::{ApiError, ApiResult};
use crate::response::{ok, ApiResponse};
use crate::routes::{ApiJson, PageQuery};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(admin_login))
        .route("/dashboard", get(dashboard))
        .route("/users", get(list_users))
        .route("/orders", get(list_orders))
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminSession {
    pub token: String,
    pub admin: Admin,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_orders: Vec<Order>,
}

/// POST /api/admin/login
async fn admin_login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<AdminLoginRequest>,
) -> ApiResult<ApiResponse<AdminSession>> {
    let mut errors = ValidationErrors::new();
    errors.check(validate_required("username", &body.username));
    errors.check(validate_required("password", &body.password));
    errors.into_result()?;

    let admin = state
        .db
        .admins()
        .find_by_username(body.username.trim())
        .await?
        .filter(|admin| verify_password(&body.password, &admin.password_hash))
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let token = state.admin_tokens.issue_admin(admin.id, &admin.username)?;
    info!(admin_id = admin.id, username = %admin.username, "Admin logged in");

    Ok(ok("Admin login successful", AdminSession { token, admin }))
}

/// GET /api/admin/dashboard
async fn dashboard(
    State(state): State<Arc<AppState>>,
    _admin: AuthAdmin,
) -> ApiResult<ApiResponse<Dashboard>> {
    let dashboard = state.db.dashboard();
    let stats = dashboard.stats().await?;
    let recent_orders = dashboard.recent_orders().await?;

    Ok(ok(
        "Dashboard data retrieved successfully",
        Dashboard {
            stats,
            recent_orders,
        },
    ))
}

/// GET /api/admin/users
async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AuthAdmin,
    Query(query): Query<PageQuery>,
) -> ApiResult<ApiResponse<Page<User>>> {
    let page = state.db.users().list(query.request()).await?;
    Ok(ok("Users retrieved successfully", page))
}

/// GET /api/admin/orders
async fn list_orders(
    State(state): State<Arc<AppState>>,
    _admin: AuthAdmin,
    Query(query): Query<PageQuery>,
) -> ApiResult<ApiResponse<Page<Order>>> {
    let page = state.db.orders().list_all(query.request()).await?;
    Ok(ok("All orders retrieved successfully", page))
}
