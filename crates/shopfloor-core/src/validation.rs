//! # Validation Module
//!
//! Input validation utilities for Shopfloor.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (serde)                                       │
//! │  └── Type validation (an integer where an integer belongs)             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths, ranges                                  │
//! │  └── Barcode alphabet, discount ranges                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (quantity >= 0, price >= 0)                                 │
//! │  ├── UNIQUE (barcode, username, discount name)                         │
//! │  └── Foreign keys                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopfloor_core::validation::{normalize_barcode, validate_line_quantity};
//!
//! assert_eq!(normalize_barcode("abc-1").unwrap(), "ABC-1");
//! assert!(validate_line_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::DiscountKind;
use crate::{FIRST_GENERATED_BARCODE, GENERATED_BARCODE_DIGITS, MAX_LINE_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest product name accepted.
pub const MAX_PRODUCT_NAME: usize = 120;

/// Longest barcode accepted.
pub const MAX_BARCODE_LEN: usize = 32;

// =============================================================================
// String Validators
// =============================================================================

/// Trims and checks a required, length-limited text field.
fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(value.to_string())
}

/// Validates and trims a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    required_text("name", name, MAX_PRODUCT_NAME)
}

/// Validates and trims a category name.
pub fn validate_category_name(name: &str) -> ValidationResult<String> {
    required_text("name", name, 60)
}

/// Validates a username: 3 to 40 characters after trimming, no spaces.
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = required_text("username", username, 40)?;
    if username.chars().count() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid_format(
            "username",
            "must not contain spaces",
        ));
    }
    Ok(username)
}

/// Validates a plain-text password before hashing.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }
    Ok(())
}

/// Validates a supplied barcode and returns its stored (upper-case) form.
///
/// ## Rules
/// - 1 to 32 characters after trimming
/// - Only `A-Z a-z 0-9 - . space`, so every stored barcode can be
///   printed as Code 128
///
/// ## Example
/// ```rust
/// use shopfloor_core::validation::normalize_barcode;
///
/// assert_eq!(normalize_barcode(" 4006381333931 ").unwrap(), "4006381333931");
/// assert!(normalize_barcode("ab/cd").is_err());
/// ```
pub fn normalize_barcode(code: &str) -> ValidationResult<String> {
    let code = required_text("barcode", code, MAX_BARCODE_LEN)?.to_ascii_uppercase();
    if let Some(bad) = code
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ' ')))
    {
        return Err(ValidationError::invalid_format(
            "barcode",
            format!("character '{}' is not allowed", bad),
        ));
    }
    Ok(code)
}

/// Turns `Some("   ")` into `None` and trims everything else.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Prices (cost, selling, refund, unit) may be zero but never negative,
/// and never above [`MAX_PRICE_CENTS`].
pub fn validate_price(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Shelf quantity set by an admin: zero or more.
pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Quantity on a sale line: 1 to [`MAX_LINE_QUANTITY`].
pub fn validate_line_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Percentage discounts are 0..=10000 bps, fixed ones are cents ≥ 0.
pub fn validate_discount_value(kind: DiscountKind, value: i64) -> ValidationResult<()> {
    match kind {
        DiscountKind::Percentage if !(0..=10_000).contains(&value) => {
            Err(ValidationError::OutOfRange {
                field: "value".to_string(),
                min: 0,
                max: 10_000,
            })
        }
        DiscountKind::Fixed if value < 0 => Err(ValidationError::Negative {
            field: "value".to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Barcode Generation
// =============================================================================

/// Next generated barcode after the highest all-digit barcode in the catalog.
///
/// ## Rules
/// - No numeric barcode yet → `100000000000`
/// - Otherwise highest + 1, zero-padded to 12 digits
///
/// ## Example
/// ```rust
/// use shopfloor_core::validation::next_barcode;
///
/// assert_eq!(next_barcode(None), "100000000000");
/// assert_eq!(next_barcode(Some(100000000041)), "100000000042");
/// assert_eq!(next_barcode(Some(7)), "000000000008");
/// ```
pub fn next_barcode(highest_numeric: Option<u64>) -> String {
    let next = match highest_numeric {
        Some(n) => n.saturating_add(1),
        None => FIRST_GENERATED_BARCODE,
    };
    format!("{:0width$}", next, width = GENERATED_BARCODE_DIGITS)
}

/// Parses a barcode as a plain number if it is all ASCII digits.
pub fn numeric_barcode(code: &str) -> Option<u64> {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
