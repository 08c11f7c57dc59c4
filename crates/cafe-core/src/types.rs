//! # Domain Types
//!
//! Core domain types used throughout the Kube Café backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    MenuItem     │   │      Order      │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  order_id (FK)  │       │
//! │  │  category_id    │   │  user_id (FK)   │   │  menu_item_id   │       │
//! │  │  name           │   │  status         │   │  quantity       │       │
//! │  │  price_cents    │   │  total_cents    │   │  price_cents    │       │
//! │  └─────────────────┘   │  checkout cols  │   │  name_snapshot  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  OrderStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Pending        │   │  Upi            │       │
//! │  │  500 = 5%       │   │  Confirmed      │   │  Card           │       │
//! │  └─────────────────┘   │  Preparing      │   │  Cod            │       │
//! │                        │  Ready          │   └─────────────────┘       │
//! │  ┌─────────────────┐   │  Delivered      │                              │
//! │  │ User / Admin    │   │  Cancelled      │                              │
//! │  │ separate tables │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids are SQLite integer rowids. Users and admins live in separate tables and
//! never share an id namespace.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5% (GST on restaurant service)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Users & Admins
// =============================================================================

/// Role stored on every user row.
///
/// The column is NOT NULL with a default of `user`, so every row decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}

/// A storefront customer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,

    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A back-office account, authenticated by username.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,

    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Menu
// =============================================================================

/// Static reference data: Coffee, Tea, Snacks, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MenuCategory {
    pub id: i64,
    pub name: String,
}

/// A sellable item on the menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub category_id: Option<i64>,

    /// Joined from `menu_categories`; NULL when uncategorised.
    pub category_name: Option<String>,

    pub description: Option<String>,

    /// Current price in paise. Orders snapshot this at checkout.
    pub price_cents: i64,

    /// Stored filename under the upload directory.
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Enums
// =============================================================================

/// Lifecycle of an order in the kitchen.
///
/// ## State Machine
/// ```text
///   pending ──► confirmed ──► preparing ──► ready ──► delivered
///      │            │             │           │
///      └────────────┴─────────────┴───────────┴──► cancelled
/// ```
/// Checkout orders start at `preparing`; the simple order flow starts at
/// `pending`. Admins may set any value, the machine above is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::InvalidOrderStatus(s.to_string()))
    }
}

/// How the customer pays. There is no gateway; non-cash methods are
/// recorded as already paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum PaymentMethod {
    Upi,
    Card,
    /// Cash on delivery
    Cod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum OrderType {
    Delivery,
    Pickup,
}

/// Pickup window chosen at checkout. Not persisted; it resolves to a
/// concrete `pickup_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PickupSlot {
    #[default]
    #[serde(rename = "in_20_min")]
    In20Min,
    #[serde(rename = "in_40_min")]
    In40Min,
}

impl PickupSlot {
    pub const fn minutes(&self) -> i64 {
        match self {
            PickupSlot::In20Min => 20,
            PickupSlot::In40Min => 40,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// An order header with its checkout metadata.
///
/// Checkout columns are `None` for orders placed through the simple
/// `POST /api/orders` flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,

    /// NULL once the owning user has been deleted.
    pub user_id: Option<i64>,

    /// Final amount charged, in paise.
    pub total_amount_cents: i64,
    pub status: OrderStatus,
    pub delivery_address: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub order_date: DateTime<Utc>,

    // ---- checkout metadata ----
    pub order_type: Option<OrderType>,
    pub pickup_time: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub subtotal_cents: Option<i64>,
    pub tax_cents: Option<i64>,
    pub delivery_fee_cents: Option<i64>,
    pub coupon_code: Option<String>,
    pub discount_cents: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub display_order_id: Option<String>,

    // ---- joined from users ----
    pub user_name: Option<String>,
    pub user_email: Option<String>,

    /// Filled by a second query per order.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// A line item of an order.
///
/// `price_cents` and `name_snapshot` are copied at order time, so later
/// menu edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i64,
    pub price_cents: i64,
    pub name_snapshot: Option<String>,

    /// Current menu name, joined for display.
    pub menu_item_name: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
