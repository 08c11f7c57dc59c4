//! # API Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                     │
//! │                                  ├──► ApiError ──► status + envelope   │
//! │  sqlx::Error ──► DbError ────────┘                                     │
//! │                                                                         │
//! │  400 validation / bad input     401 missing or bad credentials         │
//! │  403 wrong principal            404 missing entity                     │
//! │  409 duplicate                  500 everything else (logged)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A 500 never carries internal text in its body. The detail travels in a
//! response extension, and [`expose_error_detail`] copies it into the body
//! only when the server runs in development.

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cafe_core::{CoreError, FieldError, ValidationError, ValidationErrors};
use cafe_db::DbError;
use thiserror::Error;
use tracing::{error, warn};

use crate::response::failure;
use crate::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Field-level input problems.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Internal { message: String, detail: String },
}

/// Internal error text attached to 500 responses.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    pub detail: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn internal(detail: impl ToString) -> Self {
        ApiError::Internal {
            message: "Server error".to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            ApiError::Validation(errors) => {
                (status, Json(failure("Validation failed", Some(errors), None))).into_response()
            }
            ApiError::Internal { message, detail } => {
                error!(error = %detail, "Request failed");
                let mut response = (status, Json(failure(message.clone(), None, None))).into_response();
                response
                    .extensions_mut()
                    .insert(ErrorDetail { message, detail });
                response
            }
            other => (status, Json(failure(other.to_string(), None, None))).into_response(),
        }
    }
}

/// Middleware: in development, re-renders 500 bodies with the `error` field.
pub async fn expose_error_detail(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if !state.config.app_env.is_development() {
        return response;
    }

    match response.extensions().get::<ErrorDetail>().cloned() {
        Some(ErrorDetail { message, detail }) => (
            response.status(),
            Json(failure(message, None, Some(detail))),
        )
            .into_response(),
        None => response,
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::NotFound(format!("{entity} not found")),
            DbError::UniqueViolation { field, .. } => {
                ApiError::Conflict(format!("{} already exists", column_label(&field)))
            }
            DbError::ForeignKeyViolation { message } => {
                warn!(%message, "Foreign key violation");
                ApiError::BadRequest("A referenced record does not exist".to_string())
            }
            DbError::CheckViolation { message } => {
                warn!(%message, "Check constraint violation");
                ApiError::BadRequest("A value is out of the allowed range".to_string())
            }
            other => ApiError::internal(other),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => errors.into(),
            CoreError::EmptyCart | CoreError::CartTooLarge { .. } | CoreError::AmountOverflow => {
                ApiError::field("items", err.to_string())
            }
            CoreError::UnknownCoupon(_) => ApiError::field("coupon_code", err.to_string()),
            CoreError::InvalidOrderStatus(_) => ApiError::field("status", err.to_string()),
            CoreError::InvalidRole(_) => ApiError::field("role", err.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors.field_errors())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(vec![FieldError::from(&err)])
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid form data: {}", err.body_text()))
    }
}

/// `users.email` → `Email`.
fn column_label(field: &str) -> String {
    let column = field.rsplit('.').next().unwrap_or(field);
    let mut chars = column.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => "Value".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_email_is_conflict() {
        let err: ApiError = DbError::UniqueViolation {
            field: "users.email".to_string(),
            value: "a@b.co".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Email already exists");
    }

    #[test]
    fn test_not_found_message() {
        let err: ApiError = DbError::not_found("Order", 7).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Order not found");
    }

    #[test]
    fn test_unknown_coupon_is_field_error() {
        let err: ApiError = CoreError::UnknownCoupon("FREE".to_string()).into();
        match err {
            ApiError::Validation(errors) => assert_eq!(errors[0].field, "coupon_code"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_amount_overflow_is_bad_request() {
        let err: ApiError = CoreError::AmountOverflow.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        match err {
            ApiError::Validation(errors) => assert_eq!(errors[0].field, "items"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_pool_errors_are_internal() {
        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Server error");
    }

    #[test]
    fn test_column_label() {
        assert_eq!(column_label("admins.username"), "Username");
        assert_eq!(column_label("menu_categories.name"), "Name");
    }
}
