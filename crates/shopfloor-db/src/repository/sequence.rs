//! # Bill Sequence
//!
//! Hands out bill numbers: strictly increasing, starting at 1, never the
//! same number twice.
//!
//! ## How the Lock Is Taken
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Issuing a Bill Number                                │
//! │                                                                         │
//! │  BEGIN                      (deferred: no lock yet)                     │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  UPDATE bill_sequence                                                   │
//! │     SET last_bill_no = last_bill_no + 1                                 │
//! │   WHERE id = 1                                                          │
//! │  RETURNING last_bill_no     ◄── first statement is a WRITE, so SQLite   │
//! │    │                            takes the writer lock before the old    │
//! │    │                            value is read. Another till waits here  │
//! │    │                            (up to busy_timeout).                   │
//! │    ▼                                                                    │
//! │  ... rest of the checkout, still holding the writer lock ...            │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  COMMIT  → number is issued                                             │
//! │  ROLLBACK → counter goes back too; the number was never issued          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bill numbers are therefore handed out in commit order.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbResult;

/// Advances the counter inside the caller's transaction.
///
/// MUST be the first statement of the transaction so the writer lock is
/// held from the read of the old value until commit.
///
/// ## Missing Row
/// If the counter row is gone, it is rebuilt from the highest stored bill
/// number (0 for an empty store) and the next number is issued. This runs
/// under the same writer lock as normal issuance.
pub async fn issue(conn: &mut SqliteConnection) -> DbResult<i64> {
    let issued: Option<i64> = sqlx::query_scalar(
        "UPDATE bill_sequence SET last_bill_no = last_bill_no + 1 WHERE id = 1 RETURNING last_bill_no",
    )
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(bill_no) = issued {
        debug!(bill_no, "Bill number issued");
        return Ok(bill_no);
    }

    warn!("bill_sequence row missing, rebuilding from stored bills");
    let bill_no: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO bill_sequence (id, last_bill_no)
        SELECT 1, COALESCE(MAX(bill_no), 0) + 1 FROM bills
        RETURNING last_bill_no
        "#,
    )
    .fetch_one(&mut *conn)
    .await?;

    debug!(bill_no, "Bill number issued after rebuild");
    Ok(bill_no)
}

/// Standalone access to the bill counter.
#[derive(Debug, Clone)]
pub struct BillSequence {
    pool: SqlitePool,
}

impl BillSequence {
    pub fn new(pool: SqlitePool) -> Self {
        BillSequence { pool }
    }

    /// Issues a number in its own transaction.
    ///
    /// Checkout does not use this: it calls [`issue`] inside the checkout
    /// transaction so the number and the sale commit together.
    pub async fn next_bill_number(&self) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;
        let bill_no = issue(&mut tx).await?;
        tx.commit().await?;
        Ok(bill_no)
    }

    /// The last issued number (0 before the first bill).
    pub async fn peek(&self) -> DbResult<i64> {
        let last: Option<i64> =
            sqlx::query_scalar("SELECT last_bill_no FROM bill_sequence WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(last.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_numbers_start_at_one_and_increase() {
        let db = testing::memory_db().await;
        let seq = db.bill_sequence();

        assert_eq!(seq.peek().await.unwrap(), 0);
        assert_eq!(seq.next_bill_number().await.unwrap(), 1);
        assert_eq!(seq.next_bill_number().await.unwrap(), 2);
        assert_eq!(seq.peek().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rolled_back_issue_is_not_spent() {
        let db = testing::memory_db().await;

        let mut tx = db.pool().begin().await.unwrap();
        assert_eq!(issue(&mut tx).await.unwrap(), 1);
        tx.rollback().await.unwrap();

        assert_eq!(db.bill_sequence().peek().await.unwrap(), 0);
        assert_eq!(db.bill_sequence().next_bill_number().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_row_is_rebuilt() {
        let db = testing::memory_db().await;
        sqlx::query("DELETE FROM bill_sequence")
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(db.bill_sequence().peek().await.unwrap(), 0);
        assert_eq!(db.bill_sequence().next_bill_number().await.unwrap(), 1);
        assert_eq!(db.bill_sequence().next_bill_number().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_issue_never_duplicates() {
        let (db, path) = testing::file_db().await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let seq = db.bill_sequence();
            handles.push(tokio::spawn(async move { seq.next_bill_number().await }));
        }

        let mut issued = Vec::new();
        for handle in handles {
            issued.push(handle.await.unwrap().unwrap());
        }
        issued.sort_unstable();

        assert_eq!(issued, (1..=20).collect::<Vec<i64>>());
        testing::remove_file_db(db, path).await;
    }
}
