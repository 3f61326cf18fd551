//! # Authentication
//!
//! Passwords are stored as argon2 PHC strings. There are no sessions: each
//! request names its acting user in the `x-user-id` header.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Header            Actor               require_admin()                  │
//! │  ──────            ─────               ───────────────                  │
//! │  (absent)     ──►  Actor(None)    ──►  401 UNAUTHORIZED                 │
//! │  x-user-id: 7 ──►  Actor(Some(u)) ──►  u.is_admin() ? ok : 403          │
//! │  x-user-id: ? ──►  401 UNAUTHORIZED (unknown or malformed id)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shopfloor_core::User;

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

/// Header carrying the acting user's id.
pub const USER_HEADER: &str = "x-user-id";

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// The user a request acts as, if any.
#[derive(Debug, Clone)]
pub struct Actor(pub Option<User>);

impl Actor {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(User::is_admin)
    }

    /// The acting user, who must be an admin.
    pub fn require_admin(&self) -> ApiResult<&User> {
        match &self.0 {
            None => Err(ApiError::unauthorized("Sign in as an admin to do this")),
            Some(user) if user.is_admin() => Ok(user),
            Some(user) => Err(ApiError::forbidden(format!(
                "User '{}' is not an admin",
                user.username
            ))),
        }
    }
}

impl FromRequestParts<SharedState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_HEADER) else {
            return Ok(Actor(None));
        };

        let id: i64 = value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| ApiError::unauthorized(format!("Malformed {} header", USER_HEADER)))?;

        let user = state
            .db
            .users()
            .get(id)
            .await?
            .ok_or_else(|| ApiError::unauthorized(format!("Unknown user {}", id)))?;

        Ok(Actor(Some(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shopfloor_core::Role;

    fn user(role: Role) -> User {
        User {
            id: 1,
            username: "sam".into(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "plaintext"));
    }

    #[test]
    fn test_require_admin() {
        use crate::error::ErrorCode;

        assert_eq!(
            Actor(None).require_admin().unwrap_err().code,
            ErrorCode::Unauthorized
        );
        assert_eq!(
            Actor(Some(user(Role::Cashier))).require_admin().unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert!(Actor(Some(user(Role::Admin))).require_admin().is_ok());
    }
}
