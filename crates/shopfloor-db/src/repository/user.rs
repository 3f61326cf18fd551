//! # User Repository
//!
//! Till users. Passwords arrive already hashed; hashing and verification
//! live in the server.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use shopfloor_core::validation::validate_username;
use shopfloor_core::{CoreError, NewUser, User};

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a user.
    ///
    /// ## Errors
    /// - `Validation` for a bad username
    /// - `UsernameTaken` when the name exists in any casing
    pub async fn create(&self, new: NewUser) -> DbResult<User> {
        let username = validate_username(&new.username)?;

        let sql = format!(
            "INSERT INTO users (username, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING {USER_COLUMNS}"
        );
        let user: User = sqlx::query_as(&sql)
            .bind(&username)
            .bind(&new.password_hash)
            .bind(new.role)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => CoreError::UsernameTaken(username.clone()).into(),
                other => other,
            })?;

        info!(id = user.id, username = %user.username, role = ?user.role, "User registered");
        Ok(user)
    }

    /// Case-insensitive lookup for login.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        let user = sqlx::query_as(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Number of registered users. Zero means the first registration is open.
    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use shopfloor_core::Role;

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_and_find() {
        let db = testing::memory_db().await;
        let repo = db.users();
        assert_eq!(repo.count().await.unwrap(), 0);

        let admin = repo.create(new_user(" admin ", Role::Admin)).await.unwrap();
        assert_eq!(admin.username, "admin");
        assert!(admin.is_admin());

        let found = repo.find_by_username("ADMIN").await.unwrap().unwrap();
        assert_eq!(found.id, admin.id);
        assert!(found.password_hash.starts_with("$argon2id$"));
        assert_eq!(repo.get(admin.id).await.unwrap().map(|u| u.role), Some(Role::Admin));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_username_taken_ignores_case() {
        let db = testing::memory_db().await;
        db.users().create(new_user("alice", Role::Cashier)).await.unwrap();

        let err = db.users().create(new_user("Alice", Role::Cashier)).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::UsernameTaken(ref name)) if name == "Alice"));

        let short = db.users().create(new_user("al", Role::Cashier)).await;
        assert!(matches!(short, Err(DbError::Rejected(CoreError::Validation(_)))));
    }
}
