//! # Repository Module
//!
//! Database repository implementations for Kube Café.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  state.db.orders().list_all(page)                              │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── create_checkout(user_id, contact, plan)                           │
//! │  ├── create_simple(order)                                              │
//! │  ├── list_all(page) / list_for_user(user_id)                           │
//! │  ├── get(id) / get_items(order_id)                                     │
//! │  └── update_status(id, status)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`menu::MenuRepository`] - Menu items and categories
//! - [`order::OrderRepository`] - Orders, line items, checkout transaction
//! - [`user::UserRepository`] - Customer accounts
//! - [`admin::AdminRepository`] - Back-office accounts
//! - [`dashboard::DashboardRepository`] - Counts and recent orders

pub mod admin;
pub mod dashboard;
pub mod menu;
pub mod order;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }
}
