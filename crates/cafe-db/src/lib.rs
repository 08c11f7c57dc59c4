//! # cafe-db: Database Layer for Kube Café
//!
//! This crate provides database access for the café backend.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kube Café Data Flow                              │
//! │                                                                         │
//! │  axum handler (POST /api/checkout)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     cafe-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ MenuRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │    │ 001_init.sql │  │   │
//! │  │   │               │    │ UserRepo      │    │              │  │   │
//! │  │   │               │    │ AdminRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (DATABASE_URL, default ./cafe.db)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cafe_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./cafe.db")).await?;
//! let menu = db.menu().list_all().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::admin::{AdminRepository, NewAdmin};
pub use repository::dashboard::{DashboardRepository, DashboardStats};
pub use repository::menu::{MenuItemChanges, MenuRepository, NewMenuItem};
pub use repository::order::{CheckoutContact, NewOrderLine, NewSimpleOrder, OrderRepository};
pub use repository::user::{NewUser, UserChanges, UserRepository};
