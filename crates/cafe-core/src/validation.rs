//! # Validation Module
//!
//! Input validation rules for the Kube Café API.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (React forms)                                       │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: axum handler (Rust)                                          │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: field rules, collected into ValidationErrors         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (status IN ...), CHECK (quantity >= 1)                      │
//! │  ├── UNIQUE (users.email)                                              │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validator checks one field and returns the first rule it breaks.
//! Request types run several of them through [`ValidationErrors::check`] so
//! the client gets all failing fields in one response.
//!
//! ## Usage
//! ```rust
//! use cafe_core::error::ValidationErrors;
//! use cafe_core::validation::{validate_email, validate_password};
//!
//! let mut errors = ValidationErrors::new();
//! errors.check(validate_email("not-an-email"));
//! errors.check(validate_password("abc"));
//! assert_eq!(errors.errors().len(), 2);
//! ```
//!
//! [`ValidationErrors::check`]: crate::error::ValidationErrors::check

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::types::OrderStatus;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_ORDER_TOTAL_CENTS, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

/// Optional `+`, up to three digit groups with optional parentheses and a
/// single `-`, space or `.` between groups.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{1,4}[)]?[-\s.]?[(]?[0-9]{1,4}[)]?[-\s.]?[0-9]{1,9}$")
        .expect("Invalid regex")
});

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 6;
pub const ADDRESS_MAX: usize = 500;
pub const DESCRIPTION_MAX: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn validate_length(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    validate_required(field, value)?;

    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(ValidationError::Length {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

fn validate_max_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// A person's or a menu item's name: 2 to 100 characters after trimming.
///
/// ```rust
/// use cafe_core::validation::validate_name;
///
/// assert!(validate_name("name", "Masala Chai").is_ok());
/// assert!(validate_name("name", "X").is_err());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    validate_length(field, name, NAME_MIN, NAME_MAX)
}

pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_required("email", email)?;

    if !EMAIL_RE.is_match(email.trim()) {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }
    Ok(())
}

/// Passwords only need a minimum length; they are never trimmed.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: PASSWORD_MIN,
        });
    }
    Ok(())
}

pub fn validate_username(username: &str) -> ValidationResult<()> {
    validate_length("username", username, USERNAME_MIN, USERNAME_MAX)
}

pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    if !PHONE_RE.is_match(phone.trim()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be a valid phone number".to_string(),
        });
    }
    Ok(())
}

pub fn validate_address(address: &str) -> ValidationResult<()> {
    validate_max_length("delivery_address", address, ADDRESS_MAX)
}

pub fn validate_description(description: &str) -> ValidationResult<()> {
    validate_max_length("description", description, DESCRIPTION_MAX)
}

/// Parses an order status, listing the allowed values on failure.
pub fn validate_order_status(status: &str) -> ValidationResult<OrderStatus> {
    validate_required("status", status)?;

    status.trim().parse().map_err(|_| ValidationError::NotAllowed {
        field: "status".to_string(),
        allowed: OrderStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
    })
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in paise, `0..=MAX_PRICE_CENTS`.
/// Zero is allowed (complimentary items).
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    validate_amount(field, cents, MAX_PRICE_CENTS)
}

/// Validates a client-submitted order total, `0..=MAX_ORDER_TOTAL_CENTS`.
pub fn validate_total_cents(field: &str, cents: i64) -> ValidationResult<()> {
    validate_amount(field, cents, MAX_ORDER_TOTAL_CENTS)
}

fn validate_amount(field: &str, cents: i64, max: i64) -> ValidationResult<()> {
    if !(0..=max).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }
    Ok(())
}

/// Row ids start at 1.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id < 1 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// An order needs between 1 and MAX_CART_ITEMS lines.
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Jo").is_ok());
        assert!(validate_name("name", &"a".repeat(100)).is_ok());

        assert!(validate_name("name", "J").is_err());
        assert!(validate_name("name", &"a".repeat(101)).is_err());
        assert!(matches!(
            validate_name("name", ""),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("asha@kube.cafe").is_ok());
        assert!(validate_email(" asha@kube.cafe ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("asha").is_err());
        assert!(validate_email("asha@kube").is_err());
        assert!(validate_email("a sha@kube.cafe").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("ad").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 9876 543210").is_ok());
        assert!(validate_phone("(022) 555-1234").is_ok());

        assert!(validate_phone("call me").is_err());
        assert!(validate_phone("12-34-56-78").is_err());
    }

    #[test]
    fn test_validate_lengths() {
        assert!(validate_address(&"x".repeat(500)).is_ok());
        assert!(validate_address(&"x".repeat(501)).is_err());
        assert!(validate_description("").is_ok());
        assert!(validate_description(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_order_status() {
        assert_eq!(validate_order_status("ready").unwrap(), OrderStatus::Ready);
        assert!(matches!(
            validate_order_status("lost"),
            Err(ValidationError::NotAllowed { allowed, .. }) if allowed.len() == 6
        ));
        assert!(matches!(
            validate_order_status(""),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_numbers() {
        assert!(validate_price_cents("price_cents", 0).is_ok());
        assert!(validate_price_cents("price_cents", MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents("price_cents", -1).is_err());
        assert!(validate_price_cents("price_cents", MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents("price_cents", i64::MAX / 2).is_err());
        assert!(validate_total_cents("total_amount_cents", MAX_ORDER_TOTAL_CENTS).is_ok());
        assert!(validate_total_cents("total_amount_cents", MAX_ORDER_TOTAL_CENTS + 1).is_err());
        assert!(validate_id("menu_item_id", 1).is_ok());
        assert!(validate_id("menu_item_id", 0).is_err());
    }

    #[test]
    fn test_price_error_reports_the_cap() {
        let err = validate_price_cents("price_cents", -1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "price_cents".to_string(),
                min: 0,
                max: MAX_PRICE_CENTS,
            }
        );
        assert_eq!(err.to_string(), "price_cents must be between 0 and 10000000");
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_ok());
        assert!(validate_cart_size(0).is_err());
        assert!(validate_cart_size(MAX_CART_ITEMS + 1).is_err());
    }
}
