//! # Inventory Ledger
//!
//! Stock movements on `products.quantity`. Every function takes the
//! caller's connection so it runs inside the caller's transaction.
//!
//! ## Guarded Decrement
//! ```text
//! UPDATE products
//!    SET quantity = quantity - :qty
//!  WHERE id = :id AND quantity >= :qty      ◄── check and write are ONE
//! RETURNING quantity                            statement: two tills can
//!                                               never both pass the check
//!  1 row  → stock taken, new level returned
//!  0 rows → look again: missing product, or not enough stock
//! ```
//!
//! Increments have no ceiling: a return can restock past the original
//! level (found inventory, over-delivery).

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shopfloor_core::{CoreError, ValidationError};

fn positive(qty: i64) -> DbResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Takes `qty` units off a product. Returns the new stock level.
///
/// ## Errors
/// - `InsufficientStock` when fewer than `qty` are on hand
/// - `ProductNotFound` when the product doesn't exist
pub async fn decrement(conn: &mut SqliteConnection, product_id: i64, qty: i64) -> DbResult<i64> {
    positive(qty)?;

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET quantity = quantity - ?1, updated_at = ?3
        WHERE id = ?2 AND quantity >= ?1
        RETURNING quantity
        "#,
    )
    .bind(qty)
    .bind(product_id)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(remaining) = remaining {
        debug!(product_id, qty, remaining, "Stock decremented");
        return Ok(remaining);
    }

    let current: Option<(String, i64)> =
        sqlx::query_as("SELECT name, quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    Err(match current {
        Some((name, available)) => CoreError::InsufficientStock {
            product_id,
            name,
            available,
            requested: qty,
        },
        None => CoreError::ProductNotFound(product_id),
    }
    .into())
}

/// Puts `qty` units back on a product. Returns the new stock level.
pub async fn increment(conn: &mut SqliteConnection, product_id: i64, qty: i64) -> DbResult<i64> {
    positive(qty)?;

    let level: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET quantity = quantity + ?1, updated_at = ?3
        WHERE id = ?2
        RETURNING quantity
        "#,
    )
    .bind(qty)
    .bind(product_id)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    let level = level.ok_or(DbError::Rejected(CoreError::ProductNotFound(product_id)))?;
    debug!(product_id, qty, level, "Stock incremented");
    Ok(level)
}
