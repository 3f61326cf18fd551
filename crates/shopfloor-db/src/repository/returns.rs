//! # Returns Transaction
//!
//! Records goods coming back over the counter and restocks them.
//!
//! ```text
//! NewReturn::normalized()          quantity > 0, refund ≥ 0, blank → None
//!      │
//!      ▼
//! BEGIN
//!   ├── inventory::increment       first statement is a write; missing
//!   │                              product → ProductNotFound
//!   └── INSERT returns
//! COMMIT ──► ReturnRecord
//! ```
//!
//! `original_bill_no` is free text kept for reference. It is not checked
//! against the bills table.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::repository::inventory;
use shopfloor_core::{NewReturn, ReturnRecord};

const RETURN_COLUMNS: &str =
    "id, product_id, quantity, refund_price_cents, reason, original_bill_no, returned_at";

#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Records a return and puts the goods back on the shelf.
    pub async fn record(&self, new: NewReturn) -> DbResult<ReturnRecord> {
        let new = new.normalized()?;

        let mut tx = self.pool.begin().await?;

        // Writer lock is taken here, before anything is read.
        let level = inventory::increment(&mut tx, new.product_id, new.quantity).await?;

        let sql = format!(
            r#"
            INSERT INTO returns (product_id, quantity, refund_price_cents, reason, original_bill_no, returned_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {RETURN_COLUMNS}
            "#
        );
        let record: ReturnRecord = sqlx::query_as(&sql)
            .bind(new.product_id)
            .bind(new.quantity)
            .bind(new.refund_price_cents)
            .bind(&new.reason)
            .bind(&new.original_bill_no)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            return_id = record.id,
            product_id = record.product_id,
            qty = record.quantity,
            refund_cents = record.refund_total().cents(),
            stock = level,
            "Return recorded"
        );
        Ok(record)
    }

    /// Returns that reference a bill number, oldest first.
    pub async fn list_for_bill(&self, bill_no: i64) -> DbResult<Vec<ReturnRecord>> {
        let sql = format!(
            "SELECT {RETURN_COLUMNS} FROM returns WHERE original_bill_no = ?1 ORDER BY returned_at, id"
        );
        let records = sqlx::query_as(&sql)
            .bind(bill_no.to_string())
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Most recent returns first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<ReturnRecord>> {
        let sql = format!(
            "SELECT {RETURN_COLUMNS} FROM returns ORDER BY returned_at DESC, id DESC LIMIT ?1"
        );
        let records = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::DbError;
    use shopfloor_core::CoreError;

    fn new_return(product_id: i64, quantity: i64, bill: Option<&str>) -> NewReturn {
        NewReturn {
            product_id,
            quantity,
            refund_price_cents: 900,
            reason: Some("damaged".into()),
            original_bill_no: bill.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_return_restocks() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 5).await;
        let bill = db
            .checkout()
            .checkout(&testing::cash(&[(&widget, 3)], 0))
            .await
            .unwrap();

        let record = db
            .returns()
            .record(new_return(widget.id, 2, Some(&bill.bill_no.to_string())))
            .await
            .unwrap();
        assert_eq!(record.refund_total().cents(), 1800);
        assert_eq!(record.original_bill_no.as_deref(), Some("1"));

        let stock = db.products().get(widget.id).await.unwrap().unwrap().quantity;
        assert_eq!(stock, 4);

        let linked = db.returns().list_for_bill(bill.bill_no).await.unwrap();
        assert_eq!(linked, vec![record.clone()]);
        assert_eq!(db.returns().list_recent(10).await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_return_can_exceed_original_stock() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 0).await;

        db.returns().record(new_return(widget.id, 7, None)).await.unwrap();
        let stock = db.products().get(widget.id).await.unwrap().unwrap().quantity;
        assert_eq!(stock, 7);
    }

    #[tokio::test]
    async fn test_rejected_returns_leave_nothing_behind() {
        let db = testing::memory_db().await;

        assert!(matches!(
            db.returns().record(new_return(42, 1, None)).await,
            Err(DbError::Rejected(CoreError::ProductNotFound(42)))
        ));
        assert!(matches!(
            db.returns().record(new_return(42, 0, None)).await,
            Err(DbError::Rejected(CoreError::Validation(_)))
        ));
        assert!(db.returns().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_returns_wait_for_concurrent_checkouts() {
        let (db, dir) = testing::file_db().await;
        let widget = testing::product(&db, "Widget", 1000, 10_000).await;

        let mut handles = Vec::new();
        for i in 0..200 {
            let db = db.clone();
            let widget = widget.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    db.checkout()
                        .checkout(&testing::cash(&[(&widget, 1)], 0))
                        .await
                        .map(|_| ())
                } else {
                    db.returns()
                        .record(new_return(widget.id, 1, None))
                        .await
                        .map(|_| ())
                }
            }));
        }

        for handle in handles {
            if let Err(err) = handle.await.unwrap() {
                panic!("unexpected error: {err}");
            }
        }

        let stock = db.products().get(widget.id).await.unwrap().unwrap().quantity;
        assert_eq!(stock, 10_000);
        assert_eq!(db.returns().list_recent(500).await.unwrap().len(), 100);
        assert_eq!(db.bill_sequence().peek().await.unwrap(), 100);
        testing::remove_file_db(db, dir).await;
    }
}
