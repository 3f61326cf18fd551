//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:                                                           │
//! │    20.00 - 2.00 - 0.10 can print as 17.899999999999999  ❌             │
//! │                                                                         │
//! │  Net sales must equal gross - discounts - returns EXACTLY.             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    2000 - 200 - 10 = 1790 cents, always                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopfloor_core::money::Money;
//!
//! let price = Money::from_cents(1000);         // 10.00
//! let line = price.multiply_quantity(2);       // 20.00
//! let discount = line.percentage_of(1000);     // 10% = 2.00
//! assert_eq!((line - discount).to_string(), "18.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents, paise).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for net figures after returns
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as a bare integer**: `{"total": 1800}` on the wire
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.selling_price ──► CartLine.unit_price ──► CartLine.total       │
/// │                                                                         │
/// │  Cart.gross ──► Discount.amount_for(gross) ──► Cart.total               │
/// │                                                                         │
/// │  sale_lines / returns rows ──► RangeReport (gross, net, profit)         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use shopfloor_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use shopfloor_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `bps` basis points of this amount, rounded half up to the cent.
    ///
    /// ## Arguments
    /// * `bps` - Rate in basis points (1000 = 10%)
    ///
    /// ## Example
    /// ```rust
    /// use shopfloor_core::money::Money;
    ///
    /// let gross = Money::from_cents(2000);
    /// assert_eq!(gross.percentage_of(1000).cents(), 200);
    ///
    /// // 12.5% of 0.99 = 0.12375 → 0.12
    /// assert_eq!(Money::from_cents(99).percentage_of(1250).cents(), 12);
    /// ```
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, in i128 so large
    /// totals cannot overflow.
    pub fn percentage_of(&self, bps: u32) -> Money {
        let amount = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(amount as i64)
    }

    /// Restricts the value to `0..=max`.
    ///
    /// Used for fixed discounts, which may never exceed the bill they
    /// apply to.
    pub fn clamp_to(&self, max: Money) -> Money {
        Money(self.0.clamp(0, max.0.max(0)))
    }

    /// Ratio of two amounts in basis points, 0 when `whole` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use shopfloor_core::money::Money;
    ///
    /// // 2.50 margin on a 10.00 price = 25%
    /// assert_eq!(Money::from_cents(250).ratio_bps(Money::from_cents(1000)), 2500);
    /// ```
    pub fn ratio_bps(&self, whole: Money) -> i64 {
        if whole.0 == 0 {
            return 0;
        }
        ((self.0 as i128 * 10000) / whole.0 as i128) as i64
    }

    /// Divides evenly into `parts`, truncating toward zero. 0 when `parts` is 0.
    pub fn average_over(&self, parts: i64) -> Money {
        if parts == 0 {
            Money::zero()
        } else {
            Money(self.0 / parts)
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Arithmetic saturates at the i64 bounds.

/// Plain decimal rendering, `12.50` / `-2.00`.
///
/// Receipts and CSV exports use this form. No currency symbol is printed;
/// the store prints its own on pre-printed paper.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let rendered = format!("{}{}.{:02}", sign, self.major().abs(), self.minor());
        // Honour width/alignment so receipt columns line up.
        f.pad(&rendered)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
    }

    #[test]
    fn test_display_respects_width() {
        assert_eq!(format!("{:>8}", Money::from_cents(1000)), "   10.00");
        assert_eq!(format!("{:<6}|", Money::from_cents(5)), "0.05  |");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.multiply_quantity(2), max);
        assert_eq!(max + Money::from_cents(1), max);
        let min = Money::from_cents(i64::MIN);
        assert_eq!(min - Money::from_cents(1), min);
    }

    #[test]
    fn test_percentage_of_rounds_half_up() {
        assert_eq!(Money::from_cents(2000).percentage_of(1000).cents(), 200);
        // 0.5 cent rounds up
        assert_eq!(Money::from_cents(5).percentage_of(1000).cents(), 1);
        assert_eq!(Money::from_cents(4).percentage_of(1000).cents(), 0);
        assert_eq!(Money::from_cents(2000).percentage_of(10000).cents(), 2000);
    }

    #[test]
    fn test_clamp_to() {
        let gross = Money::from_cents(1500);
        assert_eq!(Money::from_cents(2000).clamp_to(gross), gross);
        assert_eq!(Money::from_cents(-1).clamp_to(gross), Money::zero());
        assert_eq!(Money::from_cents(300).clamp_to(gross).cents(), 300);
    }

    #[test]
    fn test_ratio_and_average() {
        assert_eq!(Money::from_cents(250).ratio_bps(Money::from_cents(1000)), 2500);
        assert_eq!(Money::from_cents(250).ratio_bps(Money::zero()), 0);

        assert_eq!(Money::from_cents(1000).average_over(3).cents(), 333);
        assert_eq!(Money::from_cents(1000).average_over(0), Money::zero());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
