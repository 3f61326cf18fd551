//! # Discount Repository
//!
//! Named bill-level discounts. Names are stored upper-case and are unique.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use shopfloor_core::{Discount, NewDiscount};

#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Creates a discount.
    ///
    /// ## Errors
    /// - `Validation` for a blank name or a value out of range for its kind
    /// - `UniqueViolation` for a name already in use
    pub async fn create(&self, new: NewDiscount) -> DbResult<Discount> {
        let new = new.normalized()?;

        let discount: Discount = sqlx::query_as(
            "INSERT INTO discounts (name, kind, value) VALUES (?1, ?2, ?3) RETURNING id, name, kind, value",
        )
        .bind(&new.name)
        .bind(new.kind)
        .bind(new.value)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("discount", &new.name))?;

        info!(id = discount.id, name = %discount.name, kind = ?discount.kind, value = discount.value, "Discount created");
        Ok(discount)
    }

    pub async fn list(&self) -> DbResult<Vec<Discount>> {
        let discounts = sqlx::query_as("SELECT id, name, kind, value FROM discounts ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(discounts)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Discount>> {
        let discount = sqlx::query_as("SELECT id, name, kind, value FROM discounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(discount)
    }
}
