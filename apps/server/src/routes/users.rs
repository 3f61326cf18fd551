//! Registration and login.
//!
//! The first account registered on an empty store is always an admin and
//! needs no acting user. After that only an admin may register users.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shopfloor_core::validation::{validate_password, validate_username};
use shopfloor_core::{NewUser, Role, User};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, Actor};
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(state): State<SharedState>,
    actor: Actor,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let username = validate_username(&req.username)?;
    validate_password(&req.password)?;

    let role = if state.db.users().count().await? == 0 {
        Role::Admin
    } else {
        actor.require_admin()?;
        req.role.unwrap_or(Role::Cashier)
    };

    let password_hash = hash_password(&req.password)?;
    let user = state
        .db
        .users()
        .create(NewUser {
            username,
            password_hash,
            role,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, role = ?user.role, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Checks credentials and returns the user. The till keeps the id and
/// sends it back in `x-user-id`.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<User>> {
    let user = state.db.users().find_by_username(req.username.trim()).await?;

    match user {
        Some(user) if verify_password(&req.password, &user.password_hash) => {
            info!(user_id = user.id, "Login");
            Ok(Json(user))
        }
        _ => {
            warn!(username = %req.username.trim(), "Failed login");
            Err(ApiError::unauthorized("Invalid username or password"))
        }
    }
}
