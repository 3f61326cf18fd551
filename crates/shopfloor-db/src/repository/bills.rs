//! # Bill History
//!
//! Rebuilds bills from `bills`, `sale_lines` and linked `returns` for the
//! history screen and for receipt re-prints.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use shopfloor_core::{BillLine, BillReturn, BillSummary, Money, PaymentMethod};

#[derive(sqlx::FromRow)]
struct BillRow {
    bill_no: i64,
    created_at: DateTime<Utc>,
    payment_method: PaymentMethod,
    discount_cents: i64,
    cashier_name: Option<String>,
}

const BILL_SELECT: &str = r#"
    SELECT b.bill_no, b.created_at, b.payment_method, b.discount_cents,
           u.username AS cashier_name
    FROM bills b
    LEFT JOIN users u ON u.id = b.cashier_id
"#;

#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Latest bills first.
    pub async fn history(&self, limit: u32) -> DbResult<Vec<BillSummary>> {
        let sql = format!("{BILL_SELECT} ORDER BY b.bill_no DESC LIMIT ?1");
        let rows: Vec<BillRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut bills = Vec::with_capacity(rows.len());
        for row in rows {
            bills.push(self.assemble(row).await?);
        }
        Ok(bills)
    }

    /// One bill, or `None` if the number was never issued.
    pub async fn get(&self, bill_no: i64) -> DbResult<Option<BillSummary>> {
        let sql = format!("{BILL_SELECT} WHERE b.bill_no = ?1");
        let row: Option<BillRow> = sqlx::query_as(&sql)
            .bind(bill_no)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    async fn assemble(&self, row: BillRow) -> DbResult<BillSummary> {
        let lines: Vec<BillLine> = sqlx::query_as(
            r#"
            SELECT s.product_id, p.name AS product_name, s.quantity, s.unit_price_cents,
                   s.quantity * s.unit_price_cents AS line_total_cents
            FROM sale_lines s
            JOIN products p ON p.id = s.product_id
            WHERE s.bill_no = ?1
            ORDER BY s.id
            "#,
        )
        .bind(row.bill_no)
        .fetch_all(&self.pool)
        .await?;

        let returns: Vec<BillReturn> = sqlx::query_as(
            r#"
            SELECT r.product_id, p.name AS product_name, r.quantity, r.refund_price_cents,
                   r.reason, r.returned_at
            FROM returns r
            JOIN products p ON p.id = r.product_id
            WHERE r.original_bill_no = ?1
            ORDER BY r.returned_at, r.id
            "#,
        )
        .bind(row.bill_no.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(BillSummary::new(
            row.bill_no,
            row.created_at,
            row.cashier_name,
            row.payment_method,
            Money::from_cents(row.discount_cents),
            lines,
            returns,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::testing;
    use shopfloor_core::{NewReturn, NewUser, Role};

    #[tokio::test]
    async fn test_history_rebuilds_bills() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 10).await;
        let gadget = testing::product(&db, "Gadget", 250, 10).await;
        let cashier = db
            .users()
            .create(NewUser {
                username: "till1".into(),
                password_hash: "x".into(),
                role: Role::Cashier,
            })
            .await
            .unwrap();

        let mut first = testing::cash(&[(&widget, 2), (&gadget, 1)], 225);
        first.cashier_id = Some(cashier.id);
        db.checkout().checkout(&first).await.unwrap();
        db.checkout()
            .checkout(&testing::cash(&[(&gadget, 4)], 0))
            .await
            .unwrap();

        db.returns()
            .record(NewReturn {
                product_id: widget.id,
                quantity: 1,
                refund_price_cents: 1000,
                reason: None,
                original_bill_no: Some("1".into()),
            })
            .await
            .unwrap();

        let history = db.bills().history(10).await.unwrap();
        assert_eq!(history.iter().map(|b| b.bill_no).collect::<Vec<_>>(), vec![2, 1]);

        let bill = &history[1];
        assert_eq!(bill.cashier_name.as_deref(), Some("till1"));
        assert_eq!(bill.lines.len(), 2);
        assert_eq!(bill.lines[0].product_name, "Widget");
        assert_eq!(bill.lines[0].line_total_cents, 2000);
        assert_eq!(bill.gross_cents, 2250);
        assert_eq!(bill.discount_cents, 225);
        assert_eq!(bill.final_amount_cents, 2025);
        assert_eq!(bill.returns.len(), 1);

        assert_eq!(history[0].cashier_name, None);
        assert!(history[0].returns.is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_bill() {
        let db = testing::memory_db().await;
        assert!(db.bills().get(1).await.unwrap().is_none());
    }
}
