//! Customer registration and login.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Router;
use cafe_core::validation::{
    validate_email, validate_name, validate_password, validate_phone, validate_required,
};
use cafe_core::{Role, User, ValidationErrors};
use cafe_db::NewUser;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, verify_password, INVALID_CREDENTIALS};
use crate::error::{ApiError, ApiResult};
use crate::response::{created, ok, ApiResponse};
use crate::routes::{non_blank, ApiJson};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_name("name", &self.name));
        errors.check(validate_email(&self.email));
        errors.check(validate_password(&self.password));
        if let Some(phone) = non_blank(&self.phone) {
            errors.check(validate_phone(phone));
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<ApiResponse<Session>> {
    body.validate()?;

    let user = state
        .db
        .users()
        .create(&NewUser {
            name: body.name.trim().to_string(),
            email: body.email.trim().to_string(),
            password_hash: hash_password(&body.password)?,
            role: Role::User,
            phone: non_blank(&body.phone).map(str::to_string),
            address: non_blank(&body.address).map(str::to_string),
        })
        .await?;

    let token = state.user_tokens.issue_user(user.id, user.role)?;
    info!(user_id = user.id, "User registered");

    Ok(created("User registered successfully", Session { token, user }))
}

/// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<ApiResponse<Session>> {
    let mut errors = ValidationErrors::new();
    errors.check(validate_required("email", &body.email));
    errors.check(validate_required("password", &body.password));
    errors.into_result()?;

    let user = state
        .db
        .users()
        .find_by_email(body.email.trim())
        .await?
        .filter(|user| verify_password(&body.password, &user.password_hash))
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let token = state.user_tokens.issue_user(user.id, user.role)?;
    info!(user_id = user.id, "User logged in");

    Ok(ok("Login successful", Session { token, user }))
}
