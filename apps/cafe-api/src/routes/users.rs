//! Customer account management for the back office.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Router;
use cafe_core::validation::{validate_email, validate_name, validate_password, validate_phone};
use cafe_core::{Page, Role, User, ValidationErrors};
use cafe_db::{NewUser, UserChanges};
use serde::Deserialize;
use tracing::info;

use crate::auth::{hash_password, AuthAdmin};
use crate::error::{ApiError, ApiResult};
use crate::response::{created, message, ok, ApiResponse};
use crate::routes::{non_blank, ApiJson, PageQuery};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}

/// Body shared by create and update. `password` is required on create and
/// optional on update, where it is only changed when present.
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UserRequest {
    fn validate(&self, creating: bool) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_name("name", &self.name));
        errors.check(validate_email(&self.email));

        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => errors.check(validate_password(password)),
            None if creating => errors.check(validate_password("")),
            None => {}
        }

        if let Some(phone) = non_blank(&self.phone) {
            errors.check(validate_phone(phone));
        }
        errors.into_result()
    }

    fn new_password_hash(&self) -> ApiResult<Option<String>> {
        self.password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(hash_password)
            .transpose()
    }
}

/// GET /api/users
async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AuthAdmin,
    Query(query): Query<PageQuery>,
) -> ApiResult<ApiResponse<Page<User>>> {
    let page = state.db.users().list(query.request()).await?;
    Ok(ok("Users retrieved successfully", page))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    _admin: AuthAdmin,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<User>> {
    let user = state
        .db
        .users()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(ok("User retrieved successfully", user))
}

/// POST /api/users
async fn create_user(
    State(state): State<Arc<AppState>>,
    admin: AuthAdmin,
    ApiJson(body): ApiJson<UserRequest>,
) -> ApiResult<ApiResponse<User>> {
    body.validate(true)?;
    let password_hash = body
        .new_password_hash()?
        .ok_or_else(|| ApiError::internal("password missing after validation"))?;

    let user = state
        .db
        .users()
        .create(&NewUser {
            name: body.name.trim().to_string(),
            email: body.email.trim().to_string(),
            password_hash,
            role: body.role.unwrap_or_default(),
            phone: non_blank(&body.phone).map(str::to_string),
            address: non_blank(&body.address).map(str::to_string),
        })
        .await?;

    info!(user_id = user.id, admin = %admin.username, "User created by admin");
    Ok(created("User created", user))
}

/// PUT /api/users/{id}
async fn update_user(
    State(state): State<Arc<AppState>>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UserRequest>,
) -> ApiResult<ApiResponse<User>> {
    body.validate(false)?;

    let changes = UserChanges {
        name: body.name.trim().to_string(),
        email: body.email.trim().to_string(),
        phone: non_blank(&body.phone).map(str::to_string),
        address: non_blank(&body.address).map(str::to_string),
        role: body.role,
        password_hash: body.new_password_hash()?,
    };
    let user = state.db.users().update(id, &changes).await?;

    info!(user_id = id, admin = %admin.username, "User updated by admin");
    Ok(ok("User updated", user))
}

/// DELETE /api/users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    state.db.users().delete(id).await?;

    info!(user_id = id, admin = %admin.username, "User deleted by admin");
    Ok(message("User deleted"))
}
