//! HTTP routes, one module per resource.

pub mod admin;
pub mod auth;
pub mod checkout;
pub mod health;
pub mod menu;
pub mod orders;
pub mod users;

use std::sync::Arc;

use axum::extract::{FromRequest, Request};
use axum::routing::get;
use axum::{Json, Router};
use cafe_core::PageRequest;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

/// Every route of the API, without state or layers.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/auth", auth::router())
        .nest("/api/admin", admin::router())
        .nest("/api/menu", menu::router())
        .nest("/api/orders", orders::router())
        .nest("/api/checkout", checkout::router())
        .nest("/api/users", users::router())
}

/// JSON body extractor whose rejection uses the API envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// Trimmed value, or `None` when absent or blank.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `?page=&limit=`. Unparseable values fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    fn page(&self) -> Option<u32> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }

    fn limit(&self) -> Option<u32> {
        self.limit.as_deref().and_then(|l| l.trim().parse().ok())
    }

    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page(), self.limit())
    }

    /// Only when both parameters are present and valid.
    pub fn explicit(&self) -> Option<PageRequest> {
        match (self.page(), self.limit()) {
            (Some(page), Some(limit)) => Some(PageRequest::new(Some(page), Some(limit))),
            _ => None,
        }
    }
}
