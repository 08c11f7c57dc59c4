//! # Checkout Module
//!
//! Prices a cart and derives everything an order needs before it is written.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Pipeline                                │
//! │                                                                         │
//! │  CartLine[] ──► price_cart() ──► PriceBreakdown                        │
//! │                   │                                                     │
//! │                   │  subtotal  = Σ price × qty                          │
//! │                   │  tax       = subtotal × tax rate                    │
//! │                   │  fee       = delivery ? flat fee : 0                │
//! │                   │  discount  = coupon(subtotal)                       │
//! │                   │  final     = max(0, subtotal + tax + fee − disc)    │
//! │                   ▼                                                     │
//! │  plan() ──► CheckoutPlan                                               │
//! │               ├── payment_status  (cod → pending, else paid)           │
//! │               ├── pickup_time     (pickup only: now + 20 / 40 min)      │
//! │               ├── display_order_id (KK-XXXXXX)                         │
//! │               └── status           (preparing)                          │
//! │                                                                         │
//! │  The plan is handed to cafe-db, which writes it in one transaction.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices are always computed here. Totals the client sends are ignored.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{OrderStatus, OrderType, PaymentMethod, PaymentStatus, PickupSlot, TaxRate};
use crate::{DEFAULT_DELIVERY_FEE_CENTS, DISPLAY_ORDER_PREFIX, MAX_CART_ITEMS};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the cart as submitted at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub menu_item_id: i64,

    /// Name the customer saw; stored as the line's snapshot.
    pub name: Option<String>,

    pub quantity: i64,

    /// Unit price at checkout.
    pub price: Money,
}

impl CartLine {
    /// `price × quantity`, or `None` on overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_mul(self.quantity)
    }
}

// =============================================================================
// Coupons
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    /// Basis points of the subtotal.
    Percent(u32),
    Flat(Money),
}

/// A recognised coupon code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    pub code: &'static str,
    pub discount: Discount,
}

/// Codes accepted at checkout.
const COUPONS: &[Coupon] = &[Coupon {
    code: "KUBE10",
    discount: Discount::Percent(1_000),
}];

impl Coupon {
    /// Looks a code up, ignoring case and surrounding whitespace.
    ///
    /// Blank input means "no coupon". Anything else that is not a known code
    /// is an error rather than a silent zero discount.
    ///
    /// ```rust
    /// use cafe_core::checkout::Coupon;
    ///
    /// assert_eq!(Coupon::lookup(" kube10 ").unwrap().unwrap().code, "KUBE10");
    /// assert!(Coupon::lookup("").unwrap().is_none());
    /// assert!(Coupon::lookup("FREEFOOD").is_err());
    /// ```
    pub fn lookup(code: &str) -> CoreResult<Option<Coupon>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        COUPONS
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .cloned()
            .map(Some)
            .ok_or_else(|| CoreError::UnknownCoupon(code.to_string()))
    }

    /// Discount this coupon grants on `subtotal`, never more than the subtotal.
    pub fn discount_on(&self, subtotal: Money) -> Money {
        let raw = match self.discount {
            Discount::Percent(bps) => subtotal.percentage(bps).unwrap_or(subtotal),
            Discount::Flat(amount) => amount,
        };
        raw.min(subtotal).floor_zero()
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Store-wide pricing knobs, loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    pub tax_rate: TaxRate,
    pub delivery_fee: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            tax_rate: TaxRate::default(),
            delivery_fee: Money::from_cents(DEFAULT_DELIVERY_FEE_CENTS),
        }
    }
}

/// Every amount that ends up on the order row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub tax: Money,
    pub delivery_fee: Money,
    pub discount: Money,
    pub final_amount: Money,
}

/// Options chosen on the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOptions {
    pub order_type: OrderType,
    pub pickup_slot: Option<PickupSlot>,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
}

/// A fully priced order, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub lines: Vec<CartLine>,
    pub breakdown: PriceBreakdown,
    /// Canonical code of the applied coupon.
    pub coupon_code: Option<String>,
    pub order_type: OrderType,
    pub pickup_time: Option<DateTime<Utc>>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub display_order_id: String,
    pub status: OrderStatus,
}

impl PricingPolicy {
    pub fn new(tax_rate: TaxRate, delivery_fee: Money) -> Self {
        PricingPolicy {
            tax_rate,
            delivery_fee,
        }
    }

    /// Prices a cart.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyCart`] for zero lines
    /// - [`CoreError::CartTooLarge`] beyond [`MAX_CART_ITEMS`] lines
    /// - [`CoreError::AmountOverflow`] when any amount leaves `i64`
    pub fn price_cart(
        &self,
        lines: &[CartLine],
        order_type: OrderType,
        coupon: Option<&Coupon>,
    ) -> CoreResult<PriceBreakdown> {
        if lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        if lines.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        let subtotal = lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.line_total()?))
            .ok_or(CoreError::AmountOverflow)?;
        let tax = subtotal
            .calculate_tax(self.tax_rate)
            .ok_or(CoreError::AmountOverflow)?;
        let delivery_fee = match order_type {
            OrderType::Delivery => self.delivery_fee,
            OrderType::Pickup => Money::zero(),
        };
        let discount = coupon.map_or(Money::zero(), |c| c.discount_on(subtotal));
        let final_amount = subtotal
            .checked_add(tax)
            .and_then(|m| m.checked_add(delivery_fee))
            .and_then(|m| m.checked_sub(discount))
            .ok_or(CoreError::AmountOverflow)?
            .floor_zero();

        Ok(PriceBreakdown {
            subtotal,
            tax,
            delivery_fee,
            discount,
            final_amount,
        })
    }

    /// Builds the complete checkout plan.
    ///
    /// `now` and `display_order_id` are passed in so the result is
    /// deterministic under test; callers use `Utc::now()` and
    /// [`generate_display_order_id`].
    pub fn plan(
        &self,
        lines: Vec<CartLine>,
        options: &CheckoutOptions,
        now: DateTime<Utc>,
        display_order_id: String,
    ) -> CoreResult<CheckoutPlan> {
        let coupon = match options.coupon_code.as_deref() {
            Some(code) => Coupon::lookup(code)?,
            None => None,
        };
        let breakdown = self.price_cart(&lines, options.order_type, coupon.as_ref())?;

        Ok(CheckoutPlan {
            lines,
            breakdown,
            coupon_code: coupon.map(|c| c.code.to_string()),
            order_type: options.order_type,
            pickup_time: pickup_time(options.order_type, options.pickup_slot, now),
            payment_method: options.payment_method,
            payment_status: payment_status_for(options.payment_method),
            display_order_id,
            status: OrderStatus::Preparing,
        })
    }
}

// =============================================================================
// Derived Fields
// =============================================================================

/// Payment is mocked: cash on delivery is collected later, everything else
/// counts as paid.
pub const fn payment_status_for(method: PaymentMethod) -> PaymentStatus {
    match method {
        PaymentMethod::Cod => PaymentStatus::Pending,
        PaymentMethod::Upi | PaymentMethod::Card => PaymentStatus::Paid,
    }
}

/// Pickup orders get `now` plus the chosen slot (20 minutes when absent).
/// Delivery orders have no pickup time.
pub fn pickup_time(
    order_type: OrderType,
    slot: Option<PickupSlot>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match order_type {
        OrderType::Pickup => {
            let minutes = slot.unwrap_or_default().minutes();
            Some(now + Duration::minutes(minutes))
        }
        OrderType::Delivery => None,
    }
}

/// Formats three bytes as a display code, e.g. `KK-0AFF3C`.
pub fn display_order_id_from_bytes(bytes: [u8; 3]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
    format!("{}{}", DISPLAY_ORDER_PREFIX, hex)
}

/// Random human-facing order code. Not unique; the integer id is the key.
pub fn generate_display_order_id() -> String {
    display_order_id_from_bytes(rand::random::<[u8; 3]>())
}

// =============================================================================
// Unit Tests
// =============================================================================
