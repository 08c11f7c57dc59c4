//! # cafe-core: Pure Business Logic for Kube Café
//!
//! This crate holds the domain rules of the café ordering platform as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kube Café Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Storefront / Admin frontend (React)                │   │
//! │  │    Menu ──► Cart ──► Checkout ──► Confirmation                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cafe-api (axum handlers)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cafe-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ checkout  │  │ validation│  │   │
//! │  │   │  Order    │  │   Money   │  │  pricing  │  │   rules   │  │   │
//! │  │   │  MenuItem │  │  TaxRate  │  │  pickup   │  │ pagination│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cafe-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, MenuItem, Order, OrderItem, enums)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`checkout`] - Cart pricing, payment status, pickup time, display codes
//! - [`pagination`] - Page/limit/offset math shared by every listing
//! - [`validation`] - Input validation with field-level errors
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cafe_core::money::Money;
//! use cafe_core::types::TaxRate;
//!
//! // ₹100.00, in paise
//! let subtotal = Money::from_cents(10_000);
//!
//! // 5% GST
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(500)).unwrap();
//! assert_eq!(tax.cents(), 500);
//! ```

pub mod checkout;
pub mod error;
pub mod money;
pub mod pagination;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{
    CartLine, CheckoutOptions, CheckoutPlan, Coupon, Discount, PriceBreakdown, PricingPolicy,
};
pub use error::{CoreError, FieldError, ValidationError, ValidationErrors};
pub use money::Money;
pub use pagination::{Page, PageRequest, Pagination};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price accepted for a menu item or cart line (₹1,00,000.00).
pub const MAX_PRICE_CENTS: i64 = 10_000_000;

/// Highest order total a client may submit: every line at the cap.
pub const MAX_ORDER_TOTAL_CENTS: i64 = MAX_PRICE_CENTS * MAX_ITEM_QUANTITY * MAX_CART_ITEMS as i64;

/// Prefix of the human-facing order code shown on the confirmation page.
pub const DISPLAY_ORDER_PREFIX: &str = "KK-";

/// Default GST applied at checkout (5%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 500;

/// Default flat delivery fee (₹40.00).
pub const DEFAULT_DELIVERY_FEE_CENTS: i64 = 4_000;
