//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - CRUD with validation in front of every write
//! - Barcode lookup for the scanner
//! - Barcode generation for products created without one
//! - Admin stock edits through the inventory ledger
//!
//! ## Barcode Generation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Generated Barcodes                                   │
//! │                                                                         │
//! │  products.barcode                                                      │
//! │  ┌──────────────────┐                                                  │
//! │  │ 100000000000     │  all digits → candidate                          │
//! │  │ 100000000041     │  all digits → candidate (highest)                │
//! │  │ 4006381333931    │  all digits → but wider, still a candidate       │
//! │  │ COKE-330         │  not numeric → ignored                           │
//! │  └──────────────────┘                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  highest + 1, zero-padded to 12 digits                                 │
//! │  (first ever: 100000000000)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The UNIQUE index on `barcode` is the final guard: two creations racing
//! for the same generated code cannot both insert.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::inventory;
use shopfloor_core::validation::{next_barcode, normalize_barcode, numeric_barcode};
use shopfloor_core::{
    CoreError, NewProduct, Product, ProductFilter, ProductListing, ProductUpdate, ValidationError,
};

const PRODUCT_COLUMNS: &str = "id, name, barcode, cost_price_cents, selling_price_cents, quantity, category_id, created_at, updated_at";

/// A product row joined with its category name.
#[derive(sqlx::FromRow)]
struct ListingRow {
    #[sqlx(flatten)]
    product: Product,
    category_name: Option<String>,
}

/// Escapes LIKE wildcards so a search for "50%" matches literally.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

async fn category_exists(conn: &mut SqliteConnection, category_id: i64) -> DbResult<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?1")
        .bind(category_id)
        .fetch_optional(&mut *conn)
        .await?;
    if found.is_none() {
        return Err(ValidationError::UnknownReference {
            field: "category_id".to_string(),
            id: category_id,
        }
        .into());
    }
    Ok(())
}

async fn generate_barcode(conn: &mut SqliteConnection) -> DbResult<String> {
    let codes: Vec<String> = sqlx::query_scalar(
        "SELECT barcode FROM products WHERE barcode <> '' AND barcode NOT GLOB '*[^0-9]*'",
    )
    .fetch_all(&mut *conn)
    .await?;

    let highest = codes.iter().filter_map(|c| numeric_barcode(c)).max();
    Ok(next_barcode(highest))
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Scanner input
/// let product = repo.get_by_barcode("100000000000").await?;
///
/// // Catalog screen
/// let listing = repo.list(&ProductFilter { search: Some("cola".into()), ..Default::default() }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product.
    ///
    /// ## Steps
    /// 1. Field validation ([`NewProduct::normalized`])
    /// 2. Category must exist
    /// 3. Missing barcode → [`Self::next_barcode`]
    /// 4. INSERT; a taken barcode is a `UniqueViolation`
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        let new = new.normalized()?;
        let mut conn = self.pool.acquire().await?;

        if let Some(category_id) = new.category_id {
            category_exists(&mut conn, category_id).await?;
        }

        let barcode = match new.barcode {
            Some(code) => code,
            None => generate_barcode(&mut conn).await?,
        };

        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO products
                (name, barcode, cost_price_cents, selling_price_cents, quantity, category_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let product: Product = sqlx::query_as(&sql)
            .bind(&new.name)
            .bind(&barcode)
            .bind(new.cost_price_cents)
            .bind(new.selling_price_cents)
            .bind(new.quantity)
            .bind(new.category_id)
            .bind(now)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value("barcode", &barcode))?;

        info!(id = product.id, barcode = %product.barcode, name = %product.name, "Product created");
        Ok(product)
    }

    /// Gets a product by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Gets a product by barcode (scanner input).
    ///
    /// The code is trimmed; matching ignores case.
    pub async fn get_by_barcode(&self, code: &str) -> DbResult<Option<Product>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        debug!(barcode = %code, "Looking up product by barcode");

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1");
        let product = sqlx::query_as(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Catalog listing with category name and margin.
    ///
    /// `search` is a case-insensitive substring of the name. Results are
    /// sorted by name ignoring case.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<ProductListing>> {
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows: Vec<ListingRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.name, p.barcode, p.cost_price_cents, p.selling_price_cents,
                   p.quantity, p.category_id, p.created_at, p.updated_at,
                   c.name AS category_name
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE (?1 IS NULL OR p.name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR p.category_id = ?2)
            ORDER BY p.name COLLATE NOCASE, p.id
            "#,
        )
        .bind(pattern)
        .bind(filter.category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductListing::new(row.product, row.category_name))
            .collect())
    }

    /// Products with at least one unit on hand, for the billing picker.
    pub async fn in_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE quantity > 0 ORDER BY name COLLATE NOCASE, id"
        );
        let products = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(products)
    }

    /// Replaces the editable fields. The barcode never changes.
    pub async fn update(&self, id: i64, update: ProductUpdate) -> DbResult<Product> {
        let update = update.normalized()?;
        let mut conn = self.pool.acquire().await?;

        if let Some(category_id) = update.category_id {
            category_exists(&mut conn, category_id).await?;
        }

        let sql = format!(
            r#"
            UPDATE products
            SET name = ?1, cost_price_cents = ?2, selling_price_cents = ?3,
                quantity = ?4, category_id = ?5, updated_at = ?6
            WHERE id = ?7
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let product: Option<Product> = sqlx::query_as(&sql)
            .bind(&update.name)
            .bind(update.cost_price_cents)
            .bind(update.selling_price_cents)
            .bind(update.quantity)
            .bind(update.category_id)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let product = product.ok_or(DbError::Rejected(CoreError::ProductNotFound(id)))?;
        info!(id, name = %product.name, "Product updated");
        Ok(product)
    }

    /// Deletes a product that has never been sold or returned.
    ///
    /// Returns the deleted product so the caller can clean up its barcode
    /// image.
    ///
    /// ## Errors
    /// - `ProductNotFound`
    /// - `ProductHasHistory` when sale lines or returns reference it
    pub async fn delete(&self, id: i64) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;

        // The DELETE is the first statement, so the writer lock is held
        // before anything is read. History rows block it through
        // ON DELETE RESTRICT.
        let sql = format!("DELETE FROM products WHERE id = ?1 RETURNING {PRODUCT_COLUMNS}");
        let deleted: Result<Option<Product>, sqlx::Error> =
            sqlx::query_as(&sql).bind(id).fetch_optional(&mut *tx).await;

        let product = match deleted.map_err(DbError::from) {
            Ok(Some(product)) => product,
            Ok(None) => return Err(CoreError::ProductNotFound(id).into()),
            Err(DbError::ForeignKeyViolation { .. }) => {
                let (sales, returns): (i64, i64) = sqlx::query_as(
                    r#"
                    SELECT
                        (SELECT COUNT(*) FROM sale_lines WHERE product_id = ?1),
                        (SELECT COUNT(*) FROM returns WHERE product_id = ?1)
                    "#,
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

                return Err(CoreError::ProductHasHistory {
                    product_id: id,
                    sales,
                    returns,
                }
                .into());
            }
            Err(e) => return Err(e),
        };
        tx.commit().await?;

        info!(id, barcode = %product.barcode, "Product deleted");
        Ok(product)
    }

    /// The barcode a new product without one would get.
    ///
    /// Only all-digit barcodes count. The GLOB narrows the scan; the final
    /// maximum is taken numerically since codes differ in width.
    pub async fn next_barcode(&self) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        generate_barcode(&mut conn).await
    }

    /// Admin stock correction by a signed delta. Returns the new level.
    ///
    /// Goes through the ledger, so a correction can never take stock
    /// below zero.
    pub async fn adjust_stock(&self, id: i64, delta: i64) -> DbResult<i64> {
        if delta == 0 {
            return Err(ValidationError::invalid_format("delta", "must not be zero").into());
        }

        let mut tx = self.pool.begin().await?;
        let level = if delta < 0 {
            inventory::decrement(&mut tx, id, -delta).await?
        } else {
            inventory::increment(&mut tx, id, delta).await?
        };
        tx.commit().await?;

        info!(id, delta, level, "Stock adjusted");
        Ok(level)
    }

    /// Number of products in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Whether a supplied barcode is free. Used before rendering an image.
    pub async fn barcode_available(&self, code: &str) -> DbResult<bool> {
        let code = normalize_barcode(code)?;
        Ok(self.get_by_barcode(&code).await?.is_none())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use shopfloor_core::NewReturn;

    fn new_product(name: &str, category_id: i64, barcode: Option<&str>) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            cost_price_cents: 600,
            selling_price_cents: 1000,
            quantity: 5,
            category_id: Some(category_id),
            barcode: barcode.map(str::to_string),
        }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("cola"), "%cola%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[tokio::test]
    async fn test_generated_barcodes_follow_the_highest_numeric() {
        let db = testing::memory_db().await;
        let cat = db.categories().create("General").await.unwrap();
        let repo = db.products();

        assert_eq!(repo.next_barcode().await.unwrap(), "100000000000");

        let first = repo.create(new_product("First", cat.id, None)).await.unwrap();
        assert_eq!(first.barcode, "100000000000");

        repo.create(new_product("Named", cat.id, Some("coke-330"))).await.unwrap();
        repo.create(new_product("Manual", cat.id, Some("100000000041"))).await.unwrap();

        let next = repo.create(new_product("Next", cat.id, None)).await.unwrap();
        assert_eq!(next.barcode, "100000000042");
    }

    #[tokio::test]
    async fn test_barcode_lookup_ignores_case_and_whitespace() {
        let db = testing::memory_db().await;
        let cat = db.categories().create("Drinks").await.unwrap();
        let coke = db
            .products()
            .create(new_product("Cola", cat.id, Some("coke-330")))
            .await
            .unwrap();
        assert_eq!(coke.barcode, "COKE-330");

        let found = db.products().get_by_barcode("  coke-330 ").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(coke.id));
        assert!(db.products().get_by_barcode("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_barcode_is_a_conflict() {
        let db = testing::memory_db().await;
        let cat = db.categories().create("General").await.unwrap();
        db.products()
            .create(new_product("A", cat.id, Some("ABC")))
            .await
            .unwrap();

        let err = db
            .products()
            .create(new_product("B", cat.id, Some("abc")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate barcode: 'ABC' already exists");
        assert!(!db.products().barcode_available("abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_requires_existing_category() {
        let db = testing::memory_db().await;
        let err = db
            .products()
            .create(new_product("Orphan", 42, None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::Validation(ValidationError::UnknownReference { id: 42, .. }))
        ));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let db = testing::memory_db().await;
        let drinks = db.categories().create("Drinks").await.unwrap();
        let snacks = db.categories().create("Snacks").await.unwrap();
        let repo = db.products();
        repo.create(new_product("cola zero", drinks.id, None)).await.unwrap();
        repo.create(new_product("Apple Juice", drinks.id, None)).await.unwrap();
        repo.create(new_product("Cola Chips", snacks.id, None)).await.unwrap();

        let all = repo.list(&ProductFilter::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Apple Juice", "Cola Chips", "cola zero"]);
        assert_eq!(all[0].category_name, "Drinks");
        assert_eq!(all[0].margin_bps, 4000);

        let colas = repo
            .list(&ProductFilter {
                search: Some("COLA".into()),
                category_id: Some(drinks.id),
            })
            .await
            .unwrap();
        assert_eq!(colas.len(), 1);
        assert_eq!(colas[0].name, "cola zero");
    }

    #[tokio::test]
    async fn test_update_keeps_barcode() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 5).await;

        let updated = db
            .products()
            .update(
                widget.id,
                ProductUpdate {
                    name: "Widget Pro".into(),
                    cost_price_cents: 700,
                    selling_price_cents: 1200,
                    quantity: 8,
                    category_id: widget.category_id,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Widget Pro");
        assert_eq!(updated.quantity, 8);
        assert_eq!(updated.barcode, widget.barcode);

        let missing = db
            .products()
            .update(
                999,
                ProductUpdate {
                    name: "Ghost".into(),
                    cost_price_cents: 0,
                    selling_price_cents: 0,
                    quantity: 0,
                    category_id: widget.category_id,
                },
            )
            .await;
        assert!(matches!(missing, Err(DbError::Rejected(CoreError::ProductNotFound(999)))));
    }

    #[tokio::test]
    async fn test_delete_refused_with_history() {
        let db = testing::memory_db().await;
        let sold = testing::product(&db, "Sold", 1000, 5).await;
        let fresh = testing::product(&db, "Fresh", 500, 5).await;

        db.checkout()
            .checkout(&testing::cash(&[(&sold, 1)], 0))
            .await
            .unwrap();

        let err = db.products().delete(sold.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::ProductHasHistory { sales: 1, returns: 0, .. })
        ));

        let deleted = db.products().delete(fresh.id).await.unwrap();
        assert_eq!(deleted.id, fresh.id);
        assert!(db.products().get(fresh.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_refused_with_only_returns() {
        let db = testing::memory_db().await;
        let returned = testing::product(&db, "Returned", 1000, 0).await;

        db.returns()
            .record(NewReturn {
                product_id: returned.id,
                quantity: 1,
                refund_price_cents: 1000,
                reason: None,
                original_bill_no: None,
            })
            .await
            .unwrap();

        let err = db.products().delete(returned.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::ProductHasHistory { sales: 0, returns: 1, .. })
        ));
        assert!(db.products().get(returned.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let db = testing::memory_db().await;
        assert!(matches!(
            db.products().delete(404).await,
            Err(DbError::Rejected(CoreError::ProductNotFound(404)))
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_uses_guards() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 5).await;
        let repo = db.products();

        assert_eq!(repo.adjust_stock(widget.id, 3).await.unwrap(), 8);
        assert_eq!(repo.adjust_stock(widget.id, -8).await.unwrap(), 0);
        assert!(matches!(
            repo.adjust_stock(widget.id, -1).await,
            Err(DbError::Rejected(CoreError::InsufficientStock { .. }))
        ));
        assert!(repo.adjust_stock(widget.id, 0).await.is_err());
        assert!(repo.in_stock().await.unwrap().is_empty());
    }
}
