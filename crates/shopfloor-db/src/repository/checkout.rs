//! # Checkout Transaction
//!
//! Turns a validated cart into a committed bill.
//!
//! ## Transaction Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         checkout()                                      │
//! │                                                                         │
//! │  request.validate()        EmptyCart / InvalidPaymentMethod /          │
//! │       │                    line + discount rules (no storage touched)  │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── sequence::issue        → bill_no       (takes the writer lock)   │
//! │   ├── INSERT bills           (discount stored once, here)              │
//! │   ├── for each line, in order:                                         │
//! │   │     ├── inventory::decrement   ── InsufficientStock? ──┐           │
//! │   │     └── INSERT sale_lines                               │           │
//! │   ▼                                                         ▼           │
//! │  COMMIT ──► CompletedBill                        tx dropped = ROLLBACK  │
//! │                                                  (stock, lines, bill   │
//! │                                                   row and counter all  │
//! │                                                   back as they were)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Printing is not part of this. The server prints after commit, and a
//! printer failure never undoes a sale.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::repository::{inventory, sequence};
use shopfloor_core::{CheckoutRequest, CompletedBill, SaleLine};

/// Runs the checkout transaction.
#[derive(Debug, Clone)]
pub struct CheckoutRepository {
    pool: SqlitePool,
}

impl CheckoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutRepository { pool }
    }

    /// Commits a bill, or nothing at all.
    ///
    /// ## Errors
    /// - `EmptyCart`, `InvalidPaymentMethod`, `Validation`: before storage
    /// - `InsufficientStock`, `ProductNotFound`: from the line that failed;
    ///   earlier lines are rolled back
    /// - `TransactionAborted`: the writer lock wasn't available in time
    pub async fn checkout(&self, request: &CheckoutRequest) -> DbResult<CompletedBill> {
        let validated = request.validate()?;

        let mut tx = self.pool.begin().await?;

        let bill_no = sequence::issue(&mut tx).await?;
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO bills (bill_no, cashier_id, payment_method, discount_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(bill_no)
        .bind(request.cashier_id)
        .bind(validated.payment_method)
        .bind(validated.discount.cents())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            if let Err(err) = inventory::decrement(&mut tx, line.product_id, line.quantity).await {
                warn!(bill_no, product_id = line.product_id, error = %err, "Checkout rolled back");
                return Err(err);
            }

            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO sale_lines (bill_no, product_id, quantity, unit_price_cents, sold_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING id
                "#,
            )
            .bind(bill_no)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(created_at)
            .fetch_one(&mut *tx)
            .await?;

            debug!(bill_no, sale_line = id, product_id = line.product_id, qty = line.quantity, "Sale line recorded");
            lines.push(SaleLine {
                id,
                bill_no,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                sold_at: created_at,
            });
        }

        tx.commit().await?;

        let total = validated.gross - validated.discount;
        info!(
            bill_no,
            lines = lines.len(),
            gross_cents = validated.gross.cents(),
            discount_cents = validated.discount.cents(),
            total_cents = total.cents(),
            payment = validated.payment_method.as_str(),
            "Bill committed"
        );

        Ok(CompletedBill {
            bill_no,
            payment_method: validated.payment_method,
            cashier_id: request.cashier_id,
            created_at,
            lines,
            gross_cents: validated.gross.cents(),
            discount_cents: validated.discount.cents(),
            total_cents: total.cents(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::testing;
    use crate::DbError;
    use shopfloor_core::{CoreError, PaymentMethod};

    async fn stock_of(db: &crate::Database, id: i64) -> i64 {
        db.products().get(id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_checkout_decrements_and_issues_bill() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 5).await;

        let bill = db
            .checkout()
            .checkout(&testing::cash(&[(&widget, 3)], 300))
            .await
            .unwrap();

        assert_eq!(bill.bill_no, 1);
        assert_eq!(bill.payment_method, PaymentMethod::Cash);
        assert_eq!(bill.gross_cents, 3000);
        assert_eq!(bill.discount_cents, 300);
        assert_eq!(bill.total_cents, 2700);
        assert_eq!(bill.lines.len(), 1);
        assert_eq!(stock_of(&db, widget.id).await, 2);

        // Only 2 left: refused, nothing moves
        let err = db
            .checkout()
            .checkout(&testing::cash(&[(&widget, 3)], 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));
        assert_eq!(stock_of(&db, widget.id).await, 2);
        assert_eq!(db.bill_sequence().peek().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_whole_bill() {
        let db = testing::memory_db().await;
        let plenty = testing::product(&db, "Plenty", 500, 10).await;
        let scarce = testing::product(&db, "Scarce", 800, 1).await;

        let err = db
            .checkout()
            .checkout(&testing::cash(&[(&plenty, 4), (&scarce, 2)], 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::InsufficientStock { .. })));

        assert_eq!(stock_of(&db, plenty.id).await, 10);
        assert_eq!(stock_of(&db, scarce.id).await, 1);

        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_lines")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let bills: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!((lines, bills), (0, 0));

        // The counter rolled back with the bill
        let next = db
            .checkout()
            .checkout(&testing::cash(&[(&plenty, 1)], 0))
            .await
            .unwrap();
        assert_eq!(next.bill_no, 1);
    }

    #[tokio::test]
    async fn test_validation_happens_before_storage() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 5).await;

        let mut request = testing::cash(&[(&widget, 1)], 0);
        request.payment_method = Some("cheque".into());
        assert!(matches!(
            db.checkout().checkout(&request).await,
            Err(DbError::Rejected(CoreError::InvalidPaymentMethod(_)))
        ));

        let empty = testing::cash(&[], 0);
        assert!(matches!(
            db.checkout().checkout(&empty).await,
            Err(DbError::Rejected(CoreError::EmptyCart))
        ));
        assert_eq!(db.bill_sequence().peek().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 5).await;
        let mut ghost = widget.clone();
        ghost.id = 999;

        let err = db
            .checkout()
            .checkout(&testing::cash(&[(&widget, 1), (&ghost, 1)], 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::ProductNotFound(999))));
        assert_eq!(stock_of(&db, widget.id).await, 5);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() {
        let (db, dir) = testing::file_db().await;
        let widget = testing::product(&db, "Widget", 1000, 10).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let repo = db.checkout();
            let request = testing::cash(&[(&widget, 1)], 0);
            handles.push(tokio::spawn(async move { repo.checkout(&request).await }));
        }

        let mut bill_numbers = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(bill) => bill_numbers.push(bill.bill_no),
                Err(err) => assert!(
                    matches!(err, DbError::Rejected(CoreError::InsufficientStock { .. })),
                    "unexpected error: {err}"
                ),
            }
        }
        bill_numbers.sort_unstable();

        assert_eq!(bill_numbers, (1..=10).collect::<Vec<i64>>());
        assert_eq!(stock_of(&db, widget.id).await, 0);
        testing::remove_file_db(db, dir).await;
    }
}
