//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The storefront used to total carts in JavaScript:                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer paise                                            │
//! │    ₹50.00 = 5000, ₹40.00 delivery = 4000                               │
//! │    Tax and coupon percentages are basis points on integers              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The method names say "cents" for the smallest currency unit; for INR that
//! unit is the paisa.
//!
//! ## Usage
//! ```rust
//! use cafe_core::money::Money;
//!
//! let latte = Money::from_cents(18_000); // ₹180.00
//! let two = latte.checked_mul(2).unwrap();
//! assert_eq!(two.cents(), 36_000);
//!
//! // Arithmetic never wraps: overflow is reported instead
//! assert!(Money::from_cents(i64::MAX).checked_add(latte).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (paise).
///
/// ## Design Decisions
/// - **i64 (signed)**: Discounts subtract, intermediate values may dip below zero
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serializes as a bare integer**: `5000`, never `"50.00"`
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  MenuItem.price_cents ──► CartLine.price ──► CartLine.line_total        │
/// │                                                                         │
/// │  subtotal ──► + tax ──► + delivery fee ──► − coupon ──► final amount   │
/// │                                                                         │
/// │  OrderItem.price_cents keeps the snapshot, decoupled from the menu     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    ///
    /// ```rust
    /// use cafe_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // ₹10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in the smallest currency unit.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupees) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Clamps negative values to zero.
    ///
    /// Used for the final amount: a flat coupon larger than the bill must not
    /// produce a negative order total.
    #[inline]
    pub const fn floor_zero(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Calculates tax, rounding half up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * rate + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ```rust
    /// use cafe_core::money::Money;
    /// use cafe_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(10_050); // ₹100.50
    /// let gst = subtotal.calculate_tax(TaxRate::from_bps(500)).unwrap();
    /// // ₹100.50 × 5% = ₹5.025 → ₹5.03
    /// assert_eq!(gst.cents(), 503);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Option<Money> {
        self.percentage(rate.bps())
    }

    /// Returns `bps` basis points of this amount, rounding half up.
    ///
    /// The product is taken in i128; `None` when the result leaves i64.
    pub fn percentage(&self, bps: u32) -> Option<Money> {
        let value = (self.0 as i128 * bps as i128 + 5000) / 10000;
        i64::try_from(value).ok().map(Money)
    }

    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Multiplies by a quantity.
    #[inline]
    pub const fn checked_mul(self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering, e.g. `₹145.00`. Clients format for display themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
