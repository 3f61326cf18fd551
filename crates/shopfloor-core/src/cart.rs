//! # Cart
//!
//! The explicit cart a till builds before checkout.
//!
//! The cart is a plain value. The server owns one per terminal and passes
//! it into checkout by reference; the checkout transaction itself never
//! sees a cart, only the [`CheckoutRequest`] built from it.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Till Action           Server Route                Cart Change          │
//! │  ───────────           ────────────                ───────────          │
//! │                                                                         │
//! │  Scan barcode ───────► POST .../scan ────────────► add_product()       │
//! │  Pick from list ─────► POST .../items ───────────► add_product()       │
//! │  [+] ────────────────► POST .../increase ────────► increase()          │
//! │  [-] ────────────────► POST .../decrease ────────► decrease()          │
//! │  [x] ────────────────► DELETE .../items/{id} ────► remove()            │
//! │  Pick discount ──────► PUT .../discount ─────────► apply_discount()    │
//! │  Checkout ───────────► POST .../checkout ────────► to_checkout()       │
//! │                                                    then clear()         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock checks here are advisory: they stop a cashier from ringing up more
//! than the shelf shows. The binding check is the guarded decrement inside
//! the checkout transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CheckoutLine, CheckoutRequest, Discount, Product};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// A line in the cart.
///
/// Name and price are frozen when the product is first added, so the
/// cart keeps showing what the customer was quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: i64,
    pub barcode: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl CartLine {
    /// Creates a quantity-1 line from a product.
    pub fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id,
            barcode: product.barcode.clone(),
            name: product.name.clone(),
            unit_price_cents: product.selling_price_cents,
            quantity: 1,
        }
    }

    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding again bumps the quantity)
/// - Every line has quantity ≥ 1 (decreasing to 0 removes it)
/// - At most [`MAX_CART_LINES`] lines of at most [`MAX_LINE_QUANTITY`] each
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    discount: Option<Discount>,
    created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            discount: None,
            created_at: Utc::now(),
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    fn line_mut(&mut self, product_id: i64) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CoreError::NotInCart(product_id))
    }

    /// Adds one unit of a product, or bumps its quantity if already present.
    ///
    /// ## Behavior
    /// - Out-of-stock products are refused (`OutOfStock`)
    /// - An existing line grows only while it is below the shelf quantity
    ///
    /// ## Returns
    /// The line as it now stands.
    pub fn add_product(&mut self, product: &Product) -> CoreResult<CartLine> {
        if !product.in_stock() {
            return Err(CoreError::OutOfStock {
                product_id: product.id,
                name: product.name.clone(),
            });
        }

        if self.lines.iter().any(|l| l.product_id == product.id) {
            return self.increase(product.id, product.quantity);
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge { max: MAX_CART_LINES });
        }

        let line = CartLine::from_product(product);
        self.lines.push(line.clone());
        Ok(line)
    }

    /// Adds one unit to an existing line, bounded by `available` stock.
    pub fn increase(&mut self, product_id: i64, available: i64) -> CoreResult<CartLine> {
        let line = self.line_mut(product_id)?;
        if line.quantity >= available {
            return Err(CoreError::InsufficientStock {
                product_id,
                name: line.name.clone(),
                available,
                requested: line.quantity + 1,
            });
        }
        if line.quantity >= MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: line.quantity + 1,
                max: MAX_LINE_QUANTITY,
            });
        }
        line.quantity += 1;
        Ok(line.clone())
    }

    /// Takes one unit off a line. Returns the remaining quantity; at 0 the
    /// line is gone.
    pub fn decrease(&mut self, product_id: i64) -> CoreResult<i64> {
        let line = self.line_mut(product_id)?;
        line.quantity -= 1;
        let remaining = line.quantity;
        if remaining <= 0 {
            self.lines.retain(|l| l.product_id != product_id);
        }
        Ok(remaining.max(0))
    }

    /// Removes a line entirely.
    pub fn remove(&mut self, product_id: i64) -> CoreResult<CartLine> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or(CoreError::NotInCart(product_id))?;
        Ok(self.lines.remove(idx))
    }

    /// Selects the bill discount. Replaces any earlier selection.
    pub fn apply_discount(&mut self, discount: Discount) {
        self.discount = Some(discount);
    }

    pub fn clear_discount(&mut self) {
        self.discount = None;
    }

    /// Empties the cart and drops the selected discount.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = None;
        self.created_at = Utc::now();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals before discount.
    pub fn gross(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// What the selected discount takes off the current gross.
    pub fn discount_amount(&self) -> Money {
        self.discount
            .as_ref()
            .map(|d| d.amount_for(self.gross()))
            .unwrap_or_default()
    }

    /// Amount payable.
    pub fn total(&self) -> Money {
        self.gross() - self.discount_amount()
    }

    /// Builds the checkout request for this cart.
    ///
    /// The discount is computed now, once, for the whole bill.
    pub fn to_checkout(&self, payment_method: Option<String>, cashier_id: Option<i64>) -> CheckoutRequest {
        CheckoutRequest {
            lines: self
                .lines
                .iter()
                .map(|l| CheckoutLine {
                    product_id: l.product_id,
                    quantity: l.quantity,
                    unit_price_cents: l.unit_price_cents,
                })
                .collect(),
            payment_method,
            cashier_id,
            discount_cents: self.discount_amount().cents(),
        }
    }
}

/// Cart snapshot for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub discount: Option<Discount>,
    pub line_count: usize,
    pub total_quantity: i64,
    pub gross_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        CartSummary {
            lines: cart.lines.clone(),
            discount: cart.discount.clone(),
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            gross_cents: cart.gross().cents(),
            discount_cents: cart.discount_amount().cents(),
            total_cents: cart.total().cents(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiscountKind;

    fn product(id: i64, price_cents: i64, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: format!("Product {}", id),
            barcode: format!("1000000000{:02}", id),
            cost_price_cents: price_cents / 2,
            selling_price_cents: price_cents,
            quantity,
            category_id: Some(1),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_product_then_again_bumps_quantity() {
        let mut cart = Cart::new();
        let widget = product(1, 1000, 5);

        cart.add_product(&widget).unwrap();
        let line = cart.add_product(&widget).unwrap();

        assert_eq!(line.quantity, 2);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.gross().cents(), 2000);
    }

    #[test]
    fn test_out_of_stock_is_refused() {
        let mut cart = Cart::new();
        let empty_shelf = product(1, 1000, 0);

        assert!(matches!(
            cart.add_product(&empty_shelf),
            Err(CoreError::OutOfStock { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_increase_is_bounded_by_stock() {
        let mut cart = Cart::new();
        let widget = product(1, 1000, 2);

        cart.add_product(&widget).unwrap();
        cart.increase(1, 2).unwrap();
        let err = cart.increase(1, 2).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_decrease_removes_at_zero() {
        let mut cart = Cart::new();
        let widget = product(1, 1000, 5);

        cart.add_product(&widget).unwrap();
        cart.add_product(&widget).unwrap();

        assert_eq!(cart.decrease(1).unwrap(), 1);
        assert_eq!(cart.decrease(1).unwrap(), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.decrease(1).unwrap_err(), CoreError::NotInCart(1));
    }

    #[test]
    fn test_remove_line() {
        let mut cart = Cart::new();
        cart.add_product(&product(1, 1000, 5)).unwrap();
        cart.add_product(&product(2, 500, 5)).unwrap();

        let removed = cart.remove(1).unwrap();
        assert_eq!(removed.product_id, 1);
        assert_eq!(cart.line_count(), 1);
        assert!(cart.remove(1).is_err());
    }

    #[test]
    fn test_discount_and_checkout_request() {
        let mut cart = Cart::new();
        let widget = product(1, 1000, 5);
        cart.add_product(&widget).unwrap();
        cart.add_product(&widget).unwrap();
        cart.apply_discount(Discount::new(1, "TENOFF", DiscountKind::Percentage, 1000));

        assert_eq!(cart.discount_amount().cents(), 200);
        assert_eq!(cart.total().cents(), 1800);

        let req = cart.to_checkout(Some("cash".into()), Some(3));
        assert_eq!(req.discount_cents, 200);
        assert_eq!(req.lines.len(), 1);
        assert_eq!(req.lines[0].quantity, 2);
        assert_eq!(req.cashier_id, Some(3));

        cart.clear();
        assert!(cart.discount().is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_summary() {
        let mut cart = Cart::new();
        cart.add_product(&product(1, 250, 5)).unwrap();
        cart.add_product(&product(2, 100, 5)).unwrap();

        let summary = CartSummary::from(&cart);
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.total_quantity, 2);
        assert_eq!(summary.gross_cents, 350);
        assert_eq!(summary.total_cents, 350);
    }
}
