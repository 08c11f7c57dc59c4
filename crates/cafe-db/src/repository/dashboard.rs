//! Back-office dashboard: headline counts and the latest orders.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::repository::order::OrderRepository;
use cafe_core::Order;

/// Number of orders shown in the "recent orders" panel.
pub const RECENT_ORDERS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_menu_items: i64,
    pub total_orders: i64,
}

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    pub async fn stats(&self) -> DbResult<DashboardStats> {
        let (total_users, total_menu_items, total_orders): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM menu_items),
                (SELECT COUNT(*) FROM orders)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_users,
            total_menu_items,
            total_orders,
        })
    }

    /// The latest orders with the owner's name joined, items omitted.
    pub async fn recent_orders(&self) -> DbResult<Vec<Order>> {
        OrderRepository::new(self.pool.clone())
            .recent(RECENT_ORDERS)
            .await
    }
}
