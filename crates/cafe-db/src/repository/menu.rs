//! # Menu Repository
//!
//! Database operations for the catalog: menu items and their categories.
//!
//! ## Listing Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /api/menu                 → list_all()        every item          │
//! │  GET /api/menu?page=2&limit=10 → list_page(req)    newest first + page │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Both join the category name so the storefront can group items.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use cafe_core::{MenuCategory, MenuItem, Page, PageRequest};

const SELECT_MENU_ITEM: &str = r#"
    SELECT
        m.id,
        m.name,
        m.category_id,
        c.name AS category_name,
        m.description,
        m.price_cents,
        m.image,
        m.created_at
    FROM menu_items m
    LEFT JOIN menu_categories c ON c.id = m.category_id
"#;

/// Fields for a new menu item.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub name: String,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub price_cents: i64,
    pub image: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct MenuItemChanges {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub image: Option<String>,
}

/// Repository for menu database operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    /// Creates a new MenuRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// Every menu item, for the public storefront.
    pub async fn list_all(&self) -> DbResult<Vec<MenuItem>> {
        let sql = format!("{SELECT_MENU_ITEM} ORDER BY c.name, m.name, m.id");
        let items = sqlx::query_as::<_, MenuItem>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// One page of menu items, newest first.
    pub async fn list_page(&self, request: PageRequest) -> DbResult<Page<MenuItem>> {
        let total = self.count().await?;

        let sql = format!("{SELECT_MENU_ITEM} ORDER BY m.created_at DESC, m.id DESC LIMIT ?1 OFFSET ?2");
        let items = sqlx::query_as::<_, MenuItem>(&sql)
            .bind(request.limit() as i64)
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, request, total))
    }

    /// Gets a menu item by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<MenuItem>> {
        let sql = format!("{SELECT_MENU_ITEM} WHERE m.id = ?1");
        let item = sqlx::query_as::<_, MenuItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Inserts a menu item and returns it with its category joined.
    pub async fn create(&self, item: &NewMenuItem) -> DbResult<MenuItem> {
        debug!(name = %item.name, price_cents = item.price_cents, "Creating menu item");

        let result = sqlx::query(
            r#"
            INSERT INTO menu_items (name, category_id, description, price_cents, image, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.name)
        .bind(item.category_id)
        .bind(&item.description)
        .bind(item.price_cents)
        .bind(&item.image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Menu item", id))
    }

    /// Applies a partial update and returns the stored item.
    ///
    /// ## Errors
    /// [`DbError::NotFound`] when no item has this id.
    pub async fn update(&self, id: i64, changes: &MenuItemChanges) -> DbResult<MenuItem> {
        debug!(id, "Updating menu item");

        let result = sqlx::query(
            r#"
            UPDATE menu_items SET
                name = COALESCE(?2, name),
                category_id = COALESCE(?3, category_id),
                description = COALESCE(?4, description),
                price_cents = COALESCE(?5, price_cents),
                image = COALESCE(?6, image)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.category_id)
        .bind(&changes.description)
        .bind(changes.price_cents)
        .bind(&changes.image)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu item", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Menu item", id))
    }

    /// Deletes a menu item and returns what was removed, so the caller can
    /// clean up its image.
    ///
    /// ## Errors
    /// - [`DbError::NotFound`] when no item has this id
    /// - [`DbError::ForeignKeyViolation`] when past orders reference it
    pub async fn delete(&self, id: i64) -> DbResult<MenuItem> {
        let item = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Menu item", id))?;

        let result = sqlx::query("DELETE FROM menu_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu item", id));
        }

        debug!(id, "Deleted menu item");
        Ok(item)
    }

    /// Counts menu items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// All categories, alphabetically.
    pub async fn categories(&self) -> DbResult<Vec<MenuCategory>> {
        let categories =
            sqlx::query_as::<_, MenuCategory>("SELECT id, name FROM menu_categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    /// Inserts a category, or returns the existing one with the same name.
    pub async fn ensure_category(&self, name: &str) -> DbResult<MenuCategory> {
        sqlx::query("INSERT INTO menu_categories (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let category = sqlx::query_as::<_, MenuCategory>(
            "SELECT id, name FROM menu_categories WHERE name = ?1",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    fn item(name: &str, category_id: Option<i64>, price_cents: i64) -> NewMenuItem {
        NewMenuItem {
            name: name.to_string(),
            category_id,
            description: None,
            price_cents,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_joins_category_name() {
        let db = test_db().await;
        let coffee = db.menu().ensure_category("Coffee").await.unwrap();

        let latte = db
            .menu()
            .create(&item("Latte", Some(coffee.id), 18_000))
            .await
            .unwrap();

        assert_eq!(latte.category_name.as_deref(), Some("Coffee"));
        assert_eq!(latte.price_cents, 18_000);
    }

    #[tokio::test]
    async fn test_ensure_category_is_idempotent() {
        let db = test_db().await;
        let first = db.menu().ensure_category("Tea").await.unwrap();
        let second = db.menu().ensure_category("Tea").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(db.menu().categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_page_slices_and_counts() {
        let db = test_db().await;
        for i in 0..5 {
            db.menu().create(&item(&format!("Item {i}"), None, 100)).await.unwrap();
        }

        let page = db.menu().list_page(PageRequest::new(Some(2), Some(2))).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.pagination.total_pages, 3);

        let last = db.menu().list_page(PageRequest::new(Some(3), Some(2))).await.unwrap();
        assert_eq!(last.items.len(), 1);

        assert_eq!(db.menu().list_all().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let db = test_db().await;
        let mut new = item("Mocha", None, 20_000);
        new.image = Some("mocha.png".to_string());
        let mocha = db.menu().create(&new).await.unwrap();

        let updated = db
            .menu()
            .update(
                mocha.id,
                &MenuItemChanges {
                    price_cents: Some(22_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price_cents, 22_000);
        assert_eq!(updated.name, "Mocha");
        assert_eq!(updated.image.as_deref(), Some("mocha.png"));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_item() {
        let db = test_db().await;
        assert!(matches!(
            db.menu().update(99, &MenuItemChanges::default()).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(db.menu().delete(99).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let db = test_db().await;
        let result = db.menu().create(&item("Ghost", Some(404), 100)).await;
        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
    }
}
