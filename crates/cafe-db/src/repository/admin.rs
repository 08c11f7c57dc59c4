//! Back-office accounts. Admins authenticate by username and never appear
//! in the `users` table.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use cafe_core::Admin;

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
}

/// Repository for admin database operations.
#[derive(Debug, Clone)]
pub struct AdminRepository {
    pool: SqlitePool,
}

impl AdminRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AdminRepository { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, username, email, password_hash, created_at FROM admins WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    pub async fn create(&self, admin: &NewAdmin) -> DbResult<Admin> {
        let result = sqlx::query(
            "INSERT INTO admins (username, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&admin.username)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&admin.username))?;

        info!(admin_id = result.last_insert_rowid(), username = %admin.username, "Admin created");

        self.find_by_username(&admin.username)
            .await?
            .ok_or_else(|| DbError::not_found("Admin", &admin.username))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
