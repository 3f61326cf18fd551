//! # Error Types
//!
//! Domain-specific error types for shopfloor-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopfloor-core errors (this file)                                     │
//! │  ├── CoreError        - Business refusals (stock, cart, payment)       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopfloor-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps CoreError as Rejected  │
//! │                                                                         │
//! │  Server errors (in app)                                                │
//! │  └── ApiError         - What the till sees (code + message)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → HTTP         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. The checkout and returns
/// transactions raise them from inside a database transaction, which is
/// then rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Insufficient stock to complete a sale line.
    ///
    /// ## When This Occurs
    /// - A checkout line asks for more than is on hand at commit time
    /// - A cart increase would exceed the shelf quantity
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (Widget x3)
    ///      │
    ///      ▼
    /// Guarded decrement: on hand = 2
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Widget", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Whole bill rolled back, till shows "Only 2 Widget in stock"
    /// ```
    #[error("Insufficient stock for '{name}': available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Product is out of stock and cannot enter a cart.
    #[error("'{name}' is out of stock")]
    OutOfStock { product_id: i64, name: String },

    /// Checkout attempted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Payment method missing, blank or not one the store accepts.
    #[error("Invalid payment method: '{0}'")]
    InvalidPaymentMethod(String),

    /// Product has sale or return history and must be kept.
    #[error("Product {product_id} has {sales} sale line(s) and {returns} return(s) and cannot be deleted")]
    ProductHasHistory {
        product_id: i64,
        sales: i64,
        returns: i64,
    },

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(i64),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Username already registered.
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage work so the user gets an actionable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

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

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g. bad barcode character, bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Referenced record does not exist (e.g. unknown category).
    #[error("{field} {id} does not exist")]
    UnknownReference { field: String, id: i64 },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: 7,
            name: "Widget".to_string(),
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 'Widget': available 2, requested 3"
        );

        let err = CoreError::ProductHasHistory {
            product_id: 7,
            sales: 1,
            returns: 0,
        };
        assert!(err.to_string().contains("cannot be deleted"));
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("name").to_string(), "name is required");

        let err = ValidationError::Negative {
            field: "cost_price".to_string(),
        };
        assert_eq!(err.to_string(), "cost_price cannot be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("barcode").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
