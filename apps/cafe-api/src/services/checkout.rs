//! # Checkout Service
//!
//! Turns a submitted checkout form into a persisted order.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutRequest                                                        │
//! │       │  validate()          → 400 with every bad field                 │
//! │       ▼                                                                 │
//! │  PricingPolicy::plan()       → subtotal, tax, fee, coupon, final        │
//! │       │                        payment status, pickup time, KK- code    │
//! │       ▼                                                                 │
//! │  OrderRepository::create_checkout()   one transaction                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutReceipt (201)                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line prices come from the cart snapshot; totals sent by the client are
//! ignored and recomputed here.

use cafe_core::checkout::generate_display_order_id;
use cafe_core::validation::{
    validate_address, validate_cart_size, validate_email, validate_id, validate_name,
    validate_phone, validate_price_cents, validate_quantity, validate_required,
};
use cafe_core::{
    CartLine, CheckoutOptions, CheckoutPlan, FieldError, Money, OrderStatus, OrderType,
    PaymentMethod, PaymentStatus, PickupSlot, PriceBreakdown, PricingPolicy, ValidationErrors,
};
use cafe_db::{CheckoutContact, Database, DbError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub menu_item_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub quantity: i64,
    pub price_cents: i64,
}

/// Body of `POST /api/checkout`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub order_type: OrderType,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub pickup_slot: Option<PickupSlot>,
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Collects every field problem instead of stopping at the first.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.check(validate_name("customer_name", &self.customer_name));
        errors.check(validate_email(&self.email));
        errors.check(validate_phone(&self.phone));

        if self.order_type == OrderType::Delivery {
            let address = self.delivery_address.as_deref().unwrap_or_default();
            match validate_required("delivery_address", address) {
                Ok(()) => errors.check(validate_address(address)),
                Err(e) => errors.push(e),
            }
        }

        errors.check(validate_cart_size(self.items.len()));
        for item in &self.items {
            errors.check(validate_id("menu_item_id", item.menu_item_id));
            errors.check(validate_quantity(item.quantity));
            errors.check(validate_price_cents("price_cents", item.price_cents));
        }

        errors.into_result()
    }

    fn cart_lines(&self) -> Vec<CartLine> {
        self.items
            .iter()
            .map(|item| CartLine {
                menu_item_id: item.menu_item_id,
                name: item
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
                quantity: item.quantity,
                price: Money::from_cents(item.price_cents),
            })
            .collect()
    }

    fn options(&self) -> CheckoutOptions {
        CheckoutOptions {
            order_type: self.order_type,
            pickup_slot: self.pickup_slot,
            payment_method: self.payment_method,
            coupon_code: self.coupon_code.clone(),
        }
    }

    fn contact(&self) -> CheckoutContact {
        CheckoutContact {
            customer_name: self.customer_name.trim().to_string(),
            customer_email: self.email.trim().to_string(),
            phone: Some(self.phone.trim().to_string()),
            delivery_address: match self.order_type {
                OrderType::Delivery => self.delivery_address.as_deref().map(|a| a.trim().to_string()),
                OrderType::Pickup => None,
            },
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    /// Validates and prices the request.
    pub fn plan(&self, pricing: &PricingPolicy, now: DateTime<Utc>) -> ApiResult<CheckoutPlan> {
        self.validate()?;
        let plan = pricing.plan(
            self.cart_lines(),
            &self.options(),
            now,
            generate_display_order_id(),
        )?;
        Ok(plan)
    }
}

/// What the customer sees after placing the order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_id: i64,
    pub display_order_id: String,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub final_amount_cents: i64,
    pub pickup_time: Option<DateTime<Utc>>,
    pub breakdown: PriceBreakdown,
}

/// An order line pointing at a missing menu item fails the foreign key;
/// report it against `items` instead of as a server error.
pub fn unknown_menu_item(err: DbError) -> ApiError {
    match err {
        DbError::ForeignKeyViolation { .. } => ApiError::Validation(vec![FieldError {
            field: "items".to_string(),
            message: "One or more menu items do not exist".to_string(),
        }]),
        other => other.into(),
    }
}

/// Places a checkout order for `user_id`.
///
/// Nothing is written unless the whole order (header and every line) is.
pub async fn place_order(
    db: &Database,
    pricing: &PricingPolicy,
    user_id: i64,
    request: &CheckoutRequest,
) -> ApiResult<CheckoutReceipt> {
    let plan = request.plan(pricing, Utc::now())?;

    let order_id = db
        .orders()
        .create_checkout(user_id, &request.contact(), &plan)
        .await
        .map_err(unknown_menu_item)?;

    info!(
        order_id,
        user_id,
        display_order_id = %plan.display_order_id,
        payment_method = ?plan.payment_method,
        "Order placed"
    );

    Ok(CheckoutReceipt {
        order_id,
        display_order_id: plan.display_order_id,
        payment_status: plan.payment_status,
        status: plan.status,
        final_amount_cents: plan.breakdown.final_amount.cents(),
        pickup_time: plan.pickup_time,
        breakdown: plan.breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(order_type: OrderType, payment_method: PaymentMethod) -> CheckoutRequest {
        CheckoutRequest {
            customer_name: "Asha Rao".to_string(),
            email: "asha@kube.cafe".to_string(),
            phone: "9876543210".to_string(),
            order_type,
            delivery_address: Some("12 MG Road, Bengaluru".to_string()),
            pickup_slot: None,
            items: vec![CheckoutItem {
                menu_item_id: 1,
                name: Some("Cold Coffee".to_string()),
                quantity: 2,
                price_cents: 5_000,
            }],
            coupon_code: None,
            payment_method,
            notes: None,
        }
    }

    #[test]
    fn test_plan_delivery_cod() {
        let plan = request(OrderType::Delivery, PaymentMethod::Cod)
            .plan(&PricingPolicy::default(), Utc::now())
            .unwrap();

        assert_eq!(plan.breakdown.subtotal.cents(), 10_000);
        assert_eq!(plan.breakdown.tax.cents(), 500);
        assert_eq!(plan.breakdown.delivery_fee.cents(), 4_000);
        assert_eq!(plan.breakdown.final_amount.cents(), 14_500);
        assert_eq!(plan.payment_status, PaymentStatus::Pending);
        assert_eq!(plan.status, OrderStatus::Preparing);
        assert!(plan.display_order_id.starts_with("KK-"));
        assert!(plan.pickup_time.is_none());
    }

    #[test]
    fn test_plan_pickup_slot() {
        let now = Utc::now();
        let mut req = request(OrderType::Pickup, PaymentMethod::Upi);
        req.delivery_address = None;
        req.pickup_slot = Some(PickupSlot::In40Min);

        let plan = req.plan(&PricingPolicy::default(), now).unwrap();
        assert_eq!(plan.pickup_time, Some(now + Duration::minutes(40)));
        assert_eq!(plan.breakdown.delivery_fee.cents(), 0);
        assert_eq!(plan.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_delivery_requires_address() {
        let mut req = request(OrderType::Delivery, PaymentMethod::Card);
        req.delivery_address = Some("  ".to_string());

        let errors = req.validate().unwrap_err();
        assert!(errors.errors().iter().any(|e| e.field() == "delivery_address"));
    }

    #[test]
    fn test_validate_reports_every_field() {
        let mut req = request(OrderType::Pickup, PaymentMethod::Upi);
        req.customer_name = String::new();
        req.email = "not-an-email".to_string();
        req.items[0].quantity = 0;

        let fields: Vec<String> = req
            .validate()
            .unwrap_err()
            .errors()
            .iter()
            .map(|e| e.field().to_string())
            .collect();
        assert_eq!(fields, vec!["customer_name", "email", "quantity"]);
    }

    #[test]
    fn test_huge_line_price_rejected_before_pricing() {
        let mut req = request(OrderType::Delivery, PaymentMethod::Card);
        req.items[0].price_cents = i64::MAX / 2;
        req.items[0].quantity = 3;

        let errors = req.validate().unwrap_err();
        assert_eq!(errors.errors()[0].field(), "price_cents");

        // Pricing itself refuses to wrap when validation is bypassed
        let err = req.plan(&PricingPolicy::default(), Utc::now()).unwrap_err();
        match err {
            ApiError::Validation(errors) => assert_eq!(errors[0].field, "items"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_coupon_rejected() {
        let mut req = request(OrderType::Pickup, PaymentMethod::Upi);
        req.coupon_code = Some("FREEFOOD".to_string());

        let err = req.plan(&PricingPolicy::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_contact_drops_address_for_pickup() {
        let mut req = request(OrderType::Pickup, PaymentMethod::Upi);
        req.notes = Some("  less sugar ".to_string());

        let contact = req.contact();
        assert!(contact.delivery_address.is_none());
        assert_eq!(contact.notes.as_deref(), Some("less sugar"));
    }
}
