//! The JSON envelope every endpoint answers with:
//! `{ success, message, data?, errors?, error? }`.

use axum::http::StatusCode;
use axum::Json;
use cafe_core::FieldError;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Field-level validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,

    /// Underlying error text, development only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type ApiResponse<T> = (StatusCode, Json<Envelope<T>>);

/// 200 with a payload.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> ApiResponse<T> {
    with_status(StatusCode::OK, message, data)
}

/// 201 with a payload.
pub fn created<T: Serialize>(message: impl Into<String>, data: T) -> ApiResponse<T> {
    with_status(StatusCode::CREATED, message, data)
}

/// 200 with only a message.
pub fn message(message: impl Into<String>) -> ApiResponse<()> {
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
            error: None,
        }),
    )
}

fn with_status<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
) -> ApiResponse<T> {
    (
        status,
        Json(Envelope {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            error: None,
        }),
    )
}

/// Body of a failed request.
pub fn failure(
    message: impl Into<String>,
    errors: Option<Vec<FieldError>>,
    error: Option<String>,
) -> Envelope<()> {
    Envelope {
        success: false,
        message: message.into(),
        data: None,
        errors,
        error,
    }
}
