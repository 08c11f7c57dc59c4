use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Router;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::{created, ApiResponse};
use crate::routes::ApiJson;
use crate::services::checkout::{place_order, CheckoutReceipt, CheckoutRequest};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(checkout))
}

/// POST /api/checkout
async fn checkout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> ApiResult<ApiResponse<CheckoutReceipt>> {
    let receipt = place_order(&state.db, &state.pricing, user.id, &body).await?;
    Ok(created("Order placed successfully", receipt))
}
