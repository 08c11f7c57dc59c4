//! # Menu Routes
//!
//! Reads are public. Writes need an admin token and take
//! `multipart/form-data` so an image can ride along with the fields:
//!
//! | field         | create   | update   |
//! |---------------|----------|----------|
//! | `name`        | required | optional |
//! | `price_cents` | required | optional |
//! | `category_id` | optional | optional |
//! | `description` | optional | optional |
//! | `image` file  | optional | optional, replaces the old file |

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::routing::get;
use axum::Router;
use cafe_core::validation::{
    validate_description, validate_id, validate_name, validate_price_cents,
};
use cafe_core::{MenuCategory, MenuItem, ValidationError, ValidationErrors};
use cafe_db::{DbError, MenuItemChanges, NewMenuItem};
use serde::Serialize;
use tracing::info;

use crate::auth::AuthAdmin;
use crate::error::{ApiError, ApiResult};
use crate::response::{created, message, ok, ApiResponse};
use crate::routes::PageQuery;
use crate::services::uploads;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_menu).post(create_menu_item))
        .route("/categories", get(list_categories))
        .route(
            "/{id}",
            get(get_menu_item)
                .put(update_menu_item)
                .delete(delete_menu_item),
        )
}

/// Whole menu, or one page of it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MenuListing {
    All(Vec<MenuItem>),
    Page(cafe_core::Page<MenuItem>),
}

// =============================================================================
// Multipart Form
// =============================================================================

#[derive(Debug, Default)]
struct MenuForm {
    name: Option<String>,
    category_id: Option<String>,
    description: Option<String>,
    price_cents: Option<String>,
    image: Option<(String, Vec<u8>)>,
}

impl MenuForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = MenuForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await?;
                    // Browsers send an empty part when no file was chosen.
                    if !data.is_empty() {
                        form.image = Some((file_name, data.to_vec()));
                    }
                }
                "name" => form.name = Some(field.text().await?),
                "category_id" => form.category_id = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                "price_cents" => form.price_cents = Some(field.text().await?),
                _ => {}
            }
        }

        Ok(form)
    }

    fn text(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    fn parse_i64(field: &str, value: &str, errors: &mut ValidationErrors) -> Option<i64> {
        match value.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                errors.push(ValidationError::InvalidFormat {
                    field: field.to_string(),
                    reason: "must be a whole number".to_string(),
                });
                None
            }
        }
    }

    /// Validated changes; required fields are enforced when `creating`.
    fn changes(&self, creating: bool) -> Result<MenuItemChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut changes = MenuItemChanges::default();

        match Self::text(&self.name) {
            Some(name) => {
                errors.check(validate_name("name", name));
                changes.name = Some(name.to_string());
            }
            None if creating => errors.push(ValidationError::Required {
                field: "name".to_string(),
            }),
            None => {}
        }

        match Self::text(&self.price_cents) {
            Some(raw) => {
                if let Some(cents) = Self::parse_i64("price_cents", raw, &mut errors) {
                    errors.check(validate_price_cents("price_cents", cents));
                    changes.price_cents = Some(cents);
                }
            }
            None if creating => errors.push(ValidationError::Required {
                field: "price_cents".to_string(),
            }),
            None => {}
        }

        if let Some(raw) = Self::text(&self.category_id) {
            if let Some(id) = Self::parse_i64("category_id", raw, &mut errors) {
                errors.check(validate_id("category_id", id));
                changes.category_id = Some(id);
            }
        }

        if let Some(description) = Self::text(&self.description) {
            errors.check(validate_description(description));
            changes.description = Some(description.to_string());
        }

        errors.into_result()?;
        Ok(changes)
    }

    /// Stores the uploaded image, if any, and returns its file name.
    async fn store_image(&self, state: &AppState) -> ApiResult<Option<String>> {
        match &self.image {
            Some((file_name, data)) => {
                let stored = uploads::save_image(&state.config.upload_dir, file_name, data).await?;
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/menu
async fn list_menu(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<ApiResponse<MenuListing>> {
    let listing = match query.explicit() {
        Some(request) => MenuListing::Page(state.db.menu().list_page(request).await?),
        None => MenuListing::All(state.db.menu().list_all().await?),
    };
    Ok(ok("Menu items retrieved successfully", listing))
}

/// GET /api/menu/categories
async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<Vec<MenuCategory>>> {
    let categories = state.db.menu().categories().await?;
    Ok(ok("Categories retrieved successfully", categories))
}

/// GET /api/menu/{id}
async fn get_menu_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<MenuItem>> {
    let item = state
        .db
        .menu()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Menu item not found".to_string()))?;
    Ok(ok("Menu item retrieved successfully", item))
}

/// POST /api/menu
async fn create_menu_item(
    State(state): State<Arc<AppState>>,
    admin: AuthAdmin,
    multipart: Multipart,
) -> ApiResult<ApiResponse<MenuItem>> {
    let form = MenuForm::read(multipart).await?;
    let changes = form.changes(true)?;
    let image = form.store_image(&state).await?;

    let new_item = NewMenuItem {
        name: changes.name.unwrap_or_default(),
        category_id: changes.category_id,
        description: changes.description,
        price_cents: changes.price_cents.unwrap_or_default(),
        image: image.clone(),
    };

    match state.db.menu().create(&new_item).await {
        Ok(item) => {
            info!(menu_item_id = item.id, admin = %admin.username, "Menu item created");
            Ok(created("Menu item created successfully", item))
        }
        Err(e) => {
            if let Some(file) = image {
                uploads::remove_image(&state.config.upload_dir, &file).await;
            }
            Err(e.into())
        }
    }
}

/// PUT /api/menu/{id}
async fn update_menu_item(
    State(state): State<Arc<AppState>>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<ApiResponse<MenuItem>> {
    let form = MenuForm::read(multipart).await?;
    let mut changes = form.changes(false)?;

    let previous = state
        .db
        .menu()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Menu item not found".to_string()))?;

    changes.image = form.store_image(&state).await?;

    match state.db.menu().update(id, &changes).await {
        Ok(item) => {
            // A new upload replaces the old file.
            if let (Some(_), Some(old)) = (&changes.image, &previous.image) {
                uploads::remove_image(&state.config.upload_dir, old).await;
            }
            info!(menu_item_id = id, admin = %admin.username, "Menu item updated");
            Ok(ok("Menu item updated successfully", item))
        }
        Err(e) => {
            if let Some(file) = &changes.image {
                uploads::remove_image(&state.config.upload_dir, file).await;
            }
            Err(e.into())
        }
    }
}

/// DELETE /api/menu/{id}
async fn delete_menu_item(
    State(state): State<Arc<AppState>>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    let removed = state.db.menu().delete(id).await.map_err(|e| match e {
        DbError::ForeignKeyViolation { .. } => ApiError::Conflict(
            "Menu item is part of existing orders and cannot be deleted".to_string(),
        ),
        other => other.into(),
    })?;

    if let Some(image) = &removed.image {
        uploads::remove_image(&state.config.upload_dir, image).await;
    }

    info!(menu_item_id = id, admin = %admin.username, "Menu item deleted");
    Ok(message("Menu item deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: Option<&str>, price: Option<&str>) -> MenuForm {
        MenuForm {
            name: name.map(str::to_string),
            price_cents: price.map(str::to_string),
            ..MenuForm::default()
        }
    }

    #[test]
    fn test_create_requires_name_and_price() {
        let errors = form(None, None).changes(true).unwrap_err();
        let fields: Vec<&str> = errors.errors().iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["name", "price_cents"]);
    }

    #[test]
    fn test_update_allows_partial() {
        let changes = form(None, Some("18000")).changes(false).unwrap();
        assert_eq!(changes.price_cents, Some(18_000));
        assert!(changes.name.is_none());
    }

    #[test]
    fn test_non_numeric_price_rejected() {
        let errors = form(Some("Filter Coffee"), Some("12.50")).changes(true).unwrap_err();
        assert_eq!(errors.errors()[0].field(), "price_cents");
    }

    #[test]
    fn test_price_above_cap_rejected() {
        let over = (cafe_core::MAX_PRICE_CENTS + 1).to_string();
        let errors = form(Some("Gold Latte"), Some(&over)).changes(true).unwrap_err();
        assert_eq!(errors.errors()[0].field(), "price_cents");

        let at_cap = cafe_core::MAX_PRICE_CENTS.to_string();
        assert!(form(Some("Gold Latte"), Some(&at_cap)).changes(true).is_ok());
    }

    #[test]
    fn test_blank_category_ignored() {
        let mut f = form(Some("Filter Coffee"), Some("6000"));
        f.category_id = Some("  ".to_string());
        assert!(f.changes(true).unwrap().category_id.is_none());
    }
}
