//! # User Repository
//!
//! Customer accounts. `role` is a real column (`NOT NULL DEFAULT 'user'`),
//! so every query can select it unconditionally.
//!
//! Email is unique: inserting or updating to an existing address yields
//! [`DbError::UniqueViolation`], which the API reports as 409.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use cafe_core::{Page, PageRequest, Role, User};

const SELECT_USER: &str = r#"
    SELECT id, name, email, password_hash, role, phone, address, created_at
    FROM users
"#;

/// Fields for a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Full replacement of the editable profile.
///
/// `phone` and `address` are overwritten (with NULL when `None`);
/// `password_hash` and `role` are only written when present.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user and returns the stored row.
    pub async fn create(&self, user: &NewUser) -> DbResult<User> {
        debug!(email = %user.email, role = user.role.as_str(), "Creating user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, phone, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&user.email))?;

        let id = result.last_insert_rowid();
        info!(user_id = id, "User created");

        self.get(id).await?.ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE email = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// One page of users, newest first.
    pub async fn list(&self, request: PageRequest) -> DbResult<Page<User>> {
        let total = self.count().await?;

        let sql = format!("{SELECT_USER} ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(request.limit() as i64)
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(users, request, total))
    }

    /// Replaces a user's profile and returns the stored row.
    ///
    /// ## Errors
    /// - [`DbError::NotFound`] when no user has this id
    /// - [`DbError::UniqueViolation`] when the new email is taken
    pub async fn update(&self, id: i64, changes: &UserChanges) -> DbResult<User> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = ?2,
                email = ?3,
                phone = ?4,
                address = ?5,
                role = COALESCE(?6, role),
                password_hash = COALESCE(?7, password_hash)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(&changes.address)
        .bind(changes.role)
        .bind(&changes.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&changes.email))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(user_id = id, password_changed = changes.password_hash.is_some(), "User updated");
        self.get(id).await?.ok_or_else(|| DbError::not_found("User", id))
    }

    /// Deletes a user. Their orders stay, with `user_id` set to NULL.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
