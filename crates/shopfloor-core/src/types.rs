//! # Domain Types
//!
//! Core domain records used throughout Shopfloor.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  CompletedBill  │   │  ReturnRecord   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  bill_no        │   │  product_id     │       │
//! │  │  barcode        │◄──│  lines[]        │   │  quantity       │       │
//! │  │  quantity ≥ 0   │   │  discount once  │   │  refund price   │       │
//! │  │  prices (cents) │   │  payment method │   │  bill link text │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Discount      │   │ PaymentMethod   │   │     User        │       │
//! │  │  percentage bps │   │  Cash           │   │  admin          │       │
//! │  │  fixed cents    │   │  Card / Upi     │   │  cashier        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money Fields
//! Stored records keep money as `*_cents: i64` so rows map straight onto
//! SQLite INTEGER columns. Accessors hand out [`Money`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{self, ValidationResult};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Payment Method
// =============================================================================

/// How a bill was paid.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Notes and coins.
    Cash,
    /// Card on the counter terminal.
    Card,
    /// UPI / QR transfer.
    Upi,
}

impl PaymentMethod {
    /// Every accepted method, in till display order.
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Upi];

    /// Storage / wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
        }
    }

    /// Label printed on receipts.
    pub fn display_label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "UPI",
        }
    }

    /// Parses an optional label coming from the till.
    ///
    /// Missing, blank and unknown labels are all `InvalidPaymentMethod`.
    ///
    /// ## Example
    /// ```rust
    /// use shopfloor_core::types::PaymentMethod;
    ///
    /// assert_eq!(PaymentMethod::parse_label(Some(" CARD ")).unwrap(), PaymentMethod::Card);
    /// assert!(PaymentMethod::parse_label(None).is_err());
    /// assert!(PaymentMethod::parse_label(Some("")).is_err());
    /// ```
    pub fn parse_label(label: Option<&str>) -> CoreResult<Self> {
        let label = label.map(str::trim).unwrap_or_default();
        label.parse()
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            _ => Err(CoreError::InvalidPaymentMethod(s.to_string())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_label())
    }
}

// =============================================================================
// Users
// =============================================================================

/// Role of a till user.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May manage catalog, discounts and users.
    Admin,
    /// May sell and process returns.
    Cashier,
}

/// A registered user.
///
/// `password_hash` is a PHC string and never leaves the server.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input for creating a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
///
/// ## Invariants
/// - `quantity >= 0` at all times (CHECK constraint plus guarded updates)
/// - `barcode` is unique (case-insensitive) and immutable once created
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub barcode: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity: i64,
    pub category_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Cost price as Money.
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Selling price as Money.
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Selling minus cost for one unit.
    pub fn unit_margin(&self) -> Money {
        self.selling_price() - self.cost_price()
    }

    /// Whether at least one unit is on hand.
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Input for creating a product.
///
/// A blank or missing barcode means "generate one".
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity: i64,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub barcode: Option<String>,
}

impl NewProduct {
    /// Validates field rules and normalises text.
    ///
    /// Category existence and barcode uniqueness are storage checks and
    /// happen in the repository.
    pub fn normalized(self) -> ValidationResult<NewProduct> {
        let name = validation::validate_product_name(&self.name)?;
        validation::validate_price("cost_price", self.cost_price_cents)?;
        validation::validate_price("selling_price", self.selling_price_cents)?;
        validation::validate_stock_quantity(self.quantity)?;
        let category_id = self
            .category_id
            .ok_or_else(|| ValidationError::required("category_id"))?;
        let barcode = match self.barcode.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(validation::normalize_barcode(code)?),
        };

        Ok(NewProduct {
            name,
            cost_price_cents: self.cost_price_cents,
            selling_price_cents: self.selling_price_cents,
            quantity: self.quantity,
            category_id: Some(category_id),
            barcode,
        })
    }
}

/// Full replacement of a product's editable fields. The barcode stays.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity: i64,
    pub category_id: Option<i64>,
}

impl ProductUpdate {
    /// Same rules as [`NewProduct::normalized`].
    pub fn normalized(self) -> ValidationResult<ProductUpdate> {
        let name = validation::validate_product_name(&self.name)?;
        validation::validate_price("cost_price", self.cost_price_cents)?;
        validation::validate_price("selling_price", self.selling_price_cents)?;
        validation::validate_stock_quantity(self.quantity)?;
        let category_id = self
            .category_id
            .ok_or_else(|| ValidationError::required("category_id"))?;

        Ok(ProductUpdate {
            name,
            category_id: Some(category_id),
            ..self
        })
    }
}

/// Filter for the product list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    pub category_id: Option<i64>,
}

/// A product as shown in the catalog list, with its category and margin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductListing {
    pub id: i64,
    pub name: String,
    pub barcode: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity: i64,
    pub category_id: Option<i64>,
    pub category_name: String,
    pub unit_margin_cents: i64,
    /// Margin over selling price, in basis points (0 when price is 0).
    pub margin_bps: i64,
}

impl ProductListing {
    pub fn new(product: Product, category_name: Option<String>) -> Self {
        let margin = product.unit_margin();
        ProductListing {
            margin_bps: margin.ratio_bps(product.selling_price()),
            unit_margin_cents: margin.cents(),
            category_name: category_name.unwrap_or_else(|| crate::UNCATEGORIZED.to_string()),
            id: product.id,
            name: product.name,
            barcode: product.barcode,
            cost_price_cents: product.cost_price_cents,
            selling_price_cents: product.selling_price_cents,
            quantity: product.quantity,
            category_id: product.category_id,
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Kind of bill-level discount.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `value` is basis points of the bill gross (1000 = 10%).
    Percentage,
    /// `value` is an amount in cents.
    Fixed,
}

/// A named discount that a cashier can apply to a whole bill.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    pub id: i64,
    pub name: String,
    pub kind: DiscountKind,
    pub value: i64,
}

impl Discount {
    pub fn new(id: i64, name: impl Into<String>, kind: DiscountKind, value: i64) -> Self {
        Discount {
            id,
            name: name.into(),
            kind,
            value,
        }
    }

    /// The amount this discount takes off a bill with the given gross.
    ///
    /// ## Rules
    /// - Percentage: `gross × bps / 10000`, rounded half up to the cent
    /// - Fixed: the value, clamped to `0..=gross`
    ///
    /// ## Example
    /// ```rust
    /// use shopfloor_core::money::Money;
    /// use shopfloor_core::types::{Discount, DiscountKind};
    ///
    /// let fifty_off = Discount::new(2, "FIFTY", DiscountKind::Fixed, 5000);
    /// assert_eq!(fifty_off.amount_for(Money::from_cents(2000)).cents(), 2000);
    /// ```
    pub fn amount_for(&self, gross: Money) -> Money {
        match self.kind {
            DiscountKind::Percentage => {
                let bps = self.value.clamp(0, 10_000) as u32;
                gross.percentage_of(bps).clamp_to(gross)
            }
            DiscountKind::Fixed => Money::from_cents(self.value).clamp_to(gross),
        }
    }
}

/// Input for creating a discount.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewDiscount {
    pub name: String,
    pub kind: DiscountKind,
    pub value: i64,
}

impl NewDiscount {
    /// Trims and upper-cases the name, checks the value range for the kind.
    pub fn normalized(self) -> ValidationResult<NewDiscount> {
        let name = self.name.trim().to_uppercase();
        if name.is_empty() {
            return Err(ValidationError::required("name"));
        }
        if name.chars().count() > 40 {
            return Err(ValidationError::TooLong {
                field: "name".to_string(),
                max: 40,
            });
        }
        validation::validate_discount_value(self.kind, self.value)?;
        Ok(NewDiscount { name, ..self })
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// One line handed to the checkout transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl CheckoutLine {
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// Everything the checkout transaction needs.
///
/// `discount_cents` is already computed for the whole bill.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub lines: Vec<CheckoutLine>,
    pub payment_method: Option<String>,
    pub cashier_id: Option<i64>,
    #[serde(default)]
    pub discount_cents: i64,
}

/// A checkout request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub payment_method: PaymentMethod,
    pub gross: Money,
    pub discount: Money,
}

impl CheckoutRequest {
    /// Checks everything that can be checked without storage.
    ///
    /// ## Order
    /// 1. `EmptyCart`
    /// 2. `InvalidPaymentMethod`
    /// 3. Per line: quantity in `1..=MAX_LINE_QUANTITY`, price in
    ///    `0..=MAX_PRICE_CENTS`
    /// 4. Discount in `0..=gross`
    pub fn validate(&self) -> CoreResult<ValidatedCheckout> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        let payment_method = PaymentMethod::parse_label(self.payment_method.as_deref())?;

        if self.lines.len() > MAX_CART_LINES {
            return Err(CoreError::CartTooLarge { max: MAX_CART_LINES });
        }
        for line in &self.lines {
            validation::validate_line_quantity(line.quantity)?;
            validation::validate_price("unit_price", line.unit_price_cents)?;
        }

        let gross: Money = self.lines.iter().map(CheckoutLine::line_total).sum();
        let discount = Money::from_cents(self.discount_cents);
        if discount.is_negative() {
            return Err(ValidationError::Negative {
                field: "discount".to_string(),
            }
            .into());
        }
        if discount > gross {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: gross.cents(),
            }
            .into());
        }

        Ok(ValidatedCheckout {
            payment_method,
            gross,
            discount,
        })
    }
}

/// A recorded sale line.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub id: i64,
    pub bill_no: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

impl SaleLine {
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// The outcome of a committed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompletedBill {
    pub bill_no: i64,
    pub payment_method: PaymentMethod,
    pub cashier_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub lines: Vec<SaleLine>,
    pub gross_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// Returns
// =============================================================================

/// Input for the returns transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewReturn {
    pub product_id: i64,
    pub quantity: i64,
    pub refund_price_cents: i64,
    #[serde(default)]
    pub reason: Option<String>,
    /// Free-text link to the bill the goods came from. Not checked.
    #[serde(default)]
    pub original_bill_no: Option<String>,
}

impl NewReturn {
    /// Checks quantity and price, turns blank text into `None`.
    pub fn normalized(self) -> ValidationResult<NewReturn> {
        if self.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        validation::validate_price("refund_price", self.refund_price_cents)?;

        Ok(NewReturn {
            reason: validation::blank_to_none(self.reason),
            original_bill_no: validation::blank_to_none(self.original_bill_no),
            ..self
        })
    }
}

/// A recorded return.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnRecord {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub refund_price_cents: i64,
    pub reason: Option<String>,
    pub original_bill_no: Option<String>,
    #[ts(as = "String")]
    pub returned_at: DateTime<Utc>,
}

impl ReturnRecord {
    pub fn refund_total(&self) -> Money {
        Money::from_cents(self.refund_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Bill History
// =============================================================================

/// One line of a bill as shown in history.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// A return linked to a bill through its original bill number.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillReturn {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub refund_price_cents: i64,
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub returned_at: DateTime<Utc>,
}

/// A bill reconstructed from the bills table and its sale lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillSummary {
    pub bill_no: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub cashier_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<BillLine>,
    pub gross_cents: i64,
    pub discount_cents: i64,
    pub final_amount_cents: i64,
    pub returns: Vec<BillReturn>,
}

impl BillSummary {
    /// Sums the lines and derives the final amount.
    pub fn new(
        bill_no: i64,
        created_at: DateTime<Utc>,
        cashier_name: Option<String>,
        payment_method: PaymentMethod,
        discount: Money,
        lines: Vec<BillLine>,
        returns: Vec<BillReturn>,
    ) -> Self {
        let gross: Money = lines
            .iter()
            .map(|l| Money::from_cents(l.line_total_cents))
            .sum();
        BillSummary {
            bill_no,
            created_at,
            cashier_name,
            payment_method,
            gross_cents: gross.cents(),
            discount_cents: discount.cents(),
            final_amount_cents: (gross - discount).cents(),
            lines,
            returns,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i64, quantity: i64, unit_price_cents: i64) -> CheckoutLine {
        CheckoutLine {
            product_id,
            quantity,
            unit_price_cents,
        }
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("Cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert!(matches!(
            "cheque".parse::<PaymentMethod>(),
            Err(CoreError::InvalidPaymentMethod(_))
        ));
        assert!(matches!(
            PaymentMethod::parse_label(Some("   ")),
            Err(CoreError::InvalidPaymentMethod(_))
        ));
    }

    #[test]
    fn test_checkout_validation_order() {
        let empty = CheckoutRequest::default();
        assert_eq!(empty.validate().unwrap_err(), CoreError::EmptyCart);

        let no_payment = CheckoutRequest {
            lines: vec![line(1, 1, 100)],
            ..Default::default()
        };
        assert!(matches!(
            no_payment.validate(),
            Err(CoreError::InvalidPaymentMethod(_))
        ));
    }

    #[test]
    fn test_checkout_rejects_bad_lines_and_discounts() {
        let zero_qty = CheckoutRequest {
            lines: vec![line(1, 0, 100)],
            payment_method: Some("cash".into()),
            ..Default::default()
        };
        assert!(matches!(zero_qty.validate(), Err(CoreError::Validation(_))));

        let too_much_discount = CheckoutRequest {
            lines: vec![line(1, 2, 1000)],
            payment_method: Some("cash".into()),
            discount_cents: 2001,
            ..Default::default()
        };
        assert!(matches!(
            too_much_discount.validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_checkout_rejects_huge_prices() {
        let huge = CheckoutRequest {
            lines: vec![line(1, 2, i64::MAX / 2 + 1)],
            payment_method: Some("cash".into()),
            ..Default::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. })) if field == "unit_price"
        ));

        let full_cart_at_max = CheckoutRequest {
            lines: (1..=MAX_CART_LINES as i64)
                .map(|id| line(id, MAX_LINE_QUANTITY, crate::MAX_PRICE_CENTS))
                .collect(),
            payment_method: Some("cash".into()),
            ..Default::default()
        };
        let ok = full_cart_at_max.validate().unwrap();
        assert_eq!(
            ok.gross.cents(),
            MAX_CART_LINES as i64 * MAX_LINE_QUANTITY * crate::MAX_PRICE_CENTS
        );
    }

    #[test]
    fn test_checkout_totals() {
        let req = CheckoutRequest {
            lines: vec![line(1, 2, 1000), line(2, 1, 250)],
            payment_method: Some("card".into()),
            cashier_id: Some(1),
            discount_cents: 225,
        };
        let ok = req.validate().unwrap();
        assert_eq!(ok.payment_method, PaymentMethod::Card);
        assert_eq!(ok.gross.cents(), 2250);
        assert_eq!(ok.discount.cents(), 225);
    }

    #[test]
    fn test_discount_amounts() {
        let gross = Money::from_cents(2000);
        let pct = Discount::new(1, "TENOFF", DiscountKind::Percentage, 1000);
        assert_eq!(pct.amount_for(gross).cents(), 200);

        let fixed = Discount::new(2, "FIVE", DiscountKind::Fixed, 500);
        assert_eq!(fixed.amount_for(gross).cents(), 500);
        assert_eq!(fixed.amount_for(Money::from_cents(300)).cents(), 300);
    }

    #[test]
    fn test_new_discount_normalization() {
        let d = NewDiscount {
            name: "  summer ".into(),
            kind: DiscountKind::Percentage,
            value: 1500,
        }
        .normalized()
        .unwrap();
        assert_eq!(d.name, "SUMMER");

        let bad = NewDiscount {
            name: "X".into(),
            kind: DiscountKind::Percentage,
            value: 10_001,
        };
        assert!(bad.normalized().is_err());
    }

    #[test]
    fn test_new_product_normalization() {
        let p = NewProduct {
            name: "  Widget ".into(),
            cost_price_cents: 600,
            selling_price_cents: 1000,
            quantity: 5,
            category_id: Some(1),
            barcode: Some(" ab-12 ".into()),
        }
        .normalized()
        .unwrap();
        assert_eq!(p.name, "Widget");
        assert_eq!(p.barcode.as_deref(), Some("AB-12"));

        let blank_barcode = NewProduct {
            name: "Widget".into(),
            category_id: Some(1),
            barcode: Some("   ".into()),
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(blank_barcode.barcode, None);

        let no_category = NewProduct {
            name: "Widget".into(),
            ..Default::default()
        };
        assert_eq!(
            no_category.normalized().unwrap_err(),
            ValidationError::required("category_id")
        );
    }

    #[test]
    fn test_new_return_normalization() {
        let r = NewReturn {
            product_id: 1,
            quantity: 2,
            refund_price_cents: 900,
            reason: Some("  ".into()),
            original_bill_no: Some(" 17 ".into()),
        }
        .normalized()
        .unwrap();
        assert_eq!(r.reason, None);
        assert_eq!(r.original_bill_no.as_deref(), Some("17"));

        let negative = NewReturn {
            product_id: 1,
            quantity: 1,
            refund_price_cents: -1,
            ..Default::default()
        };
        assert!(negative.normalized().is_err());
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Upi).unwrap(), "\"upi\"");

        let user = User {
            id: 1,
            username: "admin".into(),
            password_hash: "$argon2id$v=19$...".into(),
            role: Role::Admin,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "admin");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_product_listing_margin() {
        let now = Utc::now();
        let product = Product {
            id: 1,
            name: "Widget".into(),
            barcode: "100000000000".into(),
            cost_price_cents: 750,
            selling_price_cents: 1000,
            quantity: 5,
            category_id: None,
            created_at: now,
            updated_at: now,
        };
        let listing = ProductListing::new(product, None);
        assert_eq!(listing.unit_margin_cents, 250);
        assert_eq!(listing.margin_bps, 2500);
        assert_eq!(listing.category_name, "Uncategorized");
    }
}
