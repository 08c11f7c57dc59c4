//! # Error Types
//!
//! Domain-specific error types for cafe-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cafe-core errors (this file)                                          │
//! │  ├── CoreError         - Business rule violations                      │
//! │  ├── ValidationError   - One field failed one rule                     │
//! │  └── ValidationErrors  - All field failures of one request             │
//! │                                                                         │
//! │  cafe-db errors (separate crate)                                       │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  cafe-api errors (in app)                                              │
//! │  └── ApiError          - What the client sees (JSON envelope)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// A cart total does not fit in the money type.
    #[error("Cart total is too large")]
    AmountOverflow,

    /// Coupon code is not known.
    #[error("Invalid coupon code: {0}")]
    UnknownCoupon(String),

    /// A value outside the order status enumeration.
    #[error("Invalid order status: {0}")]
    InvalidOrderStatus(String),

    /// A value outside `user` / `admin`.
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Validation error (wraps ValidationErrors).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value length outside the allowed window.
    #[error("{field} must be between {min} and {max} characters")]
    Length { field: String, min: usize, max: usize },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid email, invalid phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// The field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::Length { field, .. }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

/// Serializable `{field, message}` pair sent in the `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        FieldError {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Every validation failure of a single request.
///
/// Validators push into this instead of returning on the first failure, so a
/// form can highlight all bad fields at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", errors.len())]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the error of a single-field check, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.errors.push(e);
        }
    }

    pub fn push(&mut self, err: ValidationError) {
        self.errors.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn field_errors(&self) -> Vec<FieldError> {
        self.errors.iter().map(FieldError::from).collect()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors { errors: vec![err] }
    }
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::Length {
            field: "name".to_string(),
            min: 2,
            max: 100,
        };
        assert_eq!(err.to_string(), "name must be between 2 and 100 characters");
    }

    #[test]
    fn test_collects_every_failure() {
        let mut errors = ValidationErrors::new();
        errors.check(Ok(()));
        errors.check(Err(ValidationError::Required {
            field: "name".to_string(),
        }));
        errors.push(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });

        let fields: Vec<String> = errors.field_errors().into_iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["name", "password"]);
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_empty_collection_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let err: ValidationErrors = ValidationError::Required {
            field: "items".to_string(),
        }
        .into();
        let core_err: CoreError = err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
