//! # Category Repository
//!
//! Product categories. Names are unique ignoring case.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shopfloor_core::validation::validate_category_name;
use shopfloor_core::Category;

/// Repository for category operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a category.
    ///
    /// ## Errors
    /// - `Validation` for a blank or over-long name
    /// - `UniqueViolation` when the name exists in any casing
    pub async fn create(&self, name: &str) -> DbResult<Category> {
        let name = validate_category_name(name)?;

        let category: Category =
            sqlx::query_as("INSERT INTO categories (name) VALUES (?1) RETURNING id, name")
                .bind(&name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DbError::from(e).with_duplicate_value("category", &name))?;

        debug!(id = category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// All categories, alphabetical.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as("SELECT id, name FROM categories ORDER BY name COLLATE NOCASE")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Category>> {
        let category = sqlx::query_as("SELECT id, name FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    /// Case-insensitive lookup by name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as("SELECT id, name FROM categories WHERE name = ?1")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing;
    use crate::DbError;

    #[tokio::test]
    async fn test_create_and_list_sorted() {
        let db = testing::memory_db().await;
        let repo = db.categories();

        repo.create("snacks").await.unwrap();
        let drinks = repo.create("  Drinks ").await.unwrap();
        assert_eq!(drinks.name, "Drinks");

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Drinks", "snacks"]);

        assert_eq!(repo.get(drinks.id).await.unwrap(), Some(drinks));
        assert_eq!(repo.get(999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_name_ignores_case() {
        let db = testing::memory_db().await;
        db.categories().create("Drinks").await.unwrap();

        let err = db.categories().create("DRINKS").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "category"));

        let found = db.categories().find_by_name("drinks").await.unwrap();
        assert_eq!(found.map(|c| c.name), Some("Drinks".to_string()));
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let db = testing::memory_db().await;
        assert!(matches!(
            db.categories().create("   ").await,
            Err(DbError::Rejected(_))
        ));
    }
}
