use std::sync::Arc;

use axum::extract::State;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::response::{ok, ApiResponse};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<HealthStatus>> {
    if !state.db.health_check().await {
        return Err(ApiError::internal("database health check failed"));
    }

    Ok(ok(
        "Service healthy",
        HealthStatus {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}
