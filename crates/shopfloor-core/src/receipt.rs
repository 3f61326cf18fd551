//! # Receipt Layout
//!
//! Lays out a bill as fixed-width text for an 80mm thermal roll
//! (48 columns of the standard font).
//!
//! ```text
//!                  CORNER STORE
//!               14/03/2024 05:42 PM
//!                   Bill No: 17
//! @cornerstore
//! Contact: 98450 00000
//! 12 Market Road
//!
//! ------------------------------------------------
//! Item                   Qty    Price      Total
//! ------------------------------------------------
//! Widget                   2    10.00      20.00
//! ------------------------------------------------
//!                      Subtotal:        20.00
//!                      Discount:        -2.00
//! ------------------------------------------------
//!                         TOTAL:        18.00
//!                       Payment:         Cash
//!
//!             Thank you for shopping!
//!                Have a great day!
//! ```
//!
//! Device encoding (ESC/POS, spool files) belongs to whoever prints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{BillSummary, PaymentMethod};

/// Columns on the roll.
pub const RECEIPT_WIDTH: usize = 48;

const NAME_WIDTH: usize = 22;

/// Store details printed at the top of every receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHeader {
    pub name: String,
    /// Social handle, printed with a leading `@`.
    pub handle: String,
    pub contact: String,
    pub address: String,
}

/// One item line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// A receipt ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub store: StoreHeader,
    pub bill_no: i64,
    pub issued_at: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<ReceiptLine>,
    pub discount: Money,
}

impl Receipt {
    /// Builds a receipt from a bill read back from history.
    pub fn from_bill(store: StoreHeader, bill: &BillSummary) -> Self {
        Receipt {
            store,
            bill_no: bill.bill_no,
            issued_at: bill.created_at,
            payment_method: bill.payment_method,
            lines: bill
                .lines
                .iter()
                .map(|l| ReceiptLine {
                    name: l.product_name.clone(),
                    quantity: l.quantity,
                    unit_price: Money::from_cents(l.unit_price_cents),
                    line_total: Money::from_cents(l.line_total_cents),
                })
                .collect(),
            discount: Money::from_cents(bill.discount_cents),
        }
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|l| l.line_total).sum()
    }

    pub fn total(&self) -> Money {
        self.subtotal() - self.discount
    }

    /// Renders the receipt as text, one `\n`-terminated line per row.
    pub fn render(&self) -> String {
        let separator = "-".repeat(RECEIPT_WIDTH);
        let mut out: Vec<String> = Vec::new();

        out.push(centered(&self.store.name));
        out.push(centered(&self.issued_at.format("%d/%m/%Y %I:%M %p").to_string()));
        out.push(centered(&format!("Bill No: {}", self.bill_no)));
        out.push(format!("@{}", self.store.handle));
        out.push(format!("Contact: {}", self.store.contact));
        out.push(self.store.address.clone());
        out.push(String::new());

        out.push(separator.clone());
        out.push(format!("{:<22} {:>3} {:>8} {:>10}", "Item", "Qty", "Price", "Total"));
        out.push(separator.clone());
        for line in &self.lines {
            out.push(format!(
                "{:<22} {:>3} {:>8} {:>10}",
                display_name(&line.name),
                line.quantity,
                line.unit_price,
                line.line_total
            ));
        }
        out.push(separator.clone());

        if self.discount.is_positive() {
            out.push(total_row("Subtotal:", &self.subtotal().to_string()));
            out.push(total_row("Discount:", &(Money::zero() - self.discount).to_string()));
            out.push(separator);
        }
        out.push(total_row("TOTAL:", &self.total().to_string()));
        out.push(total_row("Payment:", self.payment_method.display_label()));

        out.push(String::new());
        out.push(centered("Thank you for shopping!"));
        out.push(centered("Have a great day!"));

        let mut text = out
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        text.push('\n');
        text
    }
}

/// Cuts names longer than the column to 20 characters plus `..`.
fn display_name(name: &str) -> String {
    if name.chars().count() > NAME_WIDTH {
        let cut: String = name.chars().take(NAME_WIDTH - 2).collect();
        format!("{}..", cut)
    } else {
        name.to_string()
    }
}

fn centered(text: &str) -> String {
    format!("{:^width$}", text, width = RECEIPT_WIDTH)
}

fn total_row(label: &str, value: &str) -> String {
    format!("{:>30} {:>12}", label, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn receipt(discount_cents: i64) -> Receipt {
        Receipt {
            store: StoreHeader {
                name: "Corner Store".into(),
                handle: "cornerstore".into(),
                contact: "98450 00000".into(),
                address: "12 Market Road".into(),
            },
            bill_no: 17,
            issued_at: Utc.with_ymd_and_hms(2024, 3, 14, 17, 42, 0).unwrap(),
            payment_method: PaymentMethod::Cash,
            lines: vec![ReceiptLine {
                name: "Widget".into(),
                quantity: 2,
                unit_price: Money::from_cents(1000),
                line_total: Money::from_cents(2000),
            }],
            discount: Money::from_cents(discount_cents),
        }
    }

    #[test]
    fn test_header_and_footer() {
        let text = receipt(0).render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0].trim(), "Corner Store");
        assert_eq!(lines[1].trim(), "14/03/2024 05:42 PM");
        assert_eq!(lines[2].trim(), "Bill No: 17");
        assert_eq!(lines[3], "@cornerstore");
        assert_eq!(lines[4], "Contact: 98450 00000");
        assert!(text.ends_with("Have a great day!\n"));
    }

    #[test]
    fn test_item_columns() {
        let text = receipt(0).render();
        assert!(text.contains("Item                   Qty    Price      Total"));
        assert!(text.contains("Widget                   2    10.00      20.00"));
        assert!(!text.contains("Subtotal:"));
        assert!(text.contains(&format!("{:>30} {:>12}", "TOTAL:", "20.00")));
        assert!(text.contains(&format!("{:>30} {:>12}", "Payment:", "Cash")));
    }

    #[test]
    fn test_discount_block() {
        let r = receipt(200);
        assert_eq!(r.total().cents(), 1800);

        let text = r.render();
        assert!(text.contains(&format!("{:>30} {:>12}", "Subtotal:", "20.00")));
        assert!(text.contains(&format!("{:>30} {:>12}", "Discount:", "-2.00")));
        assert!(text.contains(&format!("{:>30} {:>12}", "TOTAL:", "18.00")));
    }

    #[test]
    fn test_long_names_are_cut() {
        assert_eq!(display_name("Exactly twenty-two ch."), "Exactly twenty-two ch.");
        assert_eq!(
            display_name("Organic Cold Pressed Coconut Oil 1L"),
            "Organic Cold Pressed.."
        );
    }

    #[test]
    fn test_no_line_exceeds_width() {
        let mut r = receipt(0);
        r.lines[0].name = "A very long product name that goes on".into();
        for line in r.render().lines() {
            assert!(line.chars().count() <= RECEIPT_WIDTH, "too wide: {line:?}");
        }
    }
}
