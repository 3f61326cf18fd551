//! # Cart Handlers
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Discount │────►│ Checkout │       │
//! │  │  Cart    │     │          │     │ (option) │     │  (bill)  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │       ▲                │                                  │             │
//! │       │           scan / items                            │             │
//! │       │           increase / decrease / remove            │             │
//! │       │                                                   │             │
//! │       └──────── DELETE /carts/{terminal} ◄── success ─────┘             │
//! │                                                                         │
//! │  A failed checkout leaves the cart as it was.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every handler returns the cart as it now stands.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use shopfloor_core::cart::CartSummary;
use shopfloor_core::{CoreError, Product};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub barcode: String,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ApplyDiscountRequest {
    pub discount_id: i64,
}

async fn load_product(state: &SharedState, product_id: i64) -> ApiResult<Product> {
    state
        .db
        .products()
        .get(product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id).into())
}

pub async fn get_cart(
    State(state): State<SharedState>,
    Path(terminal): Path<String>,
) -> ApiResult<Json<CartSummary>> {
    let cart = state.carts.cart(&terminal).await?;
    let cart = cart.lock().await;
    Ok(Json(CartSummary::from(&*cart)))
}

/// Empties the cart and drops its discount.
pub async fn clear_cart(
    State(state): State<SharedState>,
    Path(terminal): Path<String>,
) -> ApiResult<Json<CartSummary>> {
    let cart = state.carts.cart(&terminal).await?;
    let mut cart = cart.lock().await;
    cart.clear();
    debug!(%terminal, "Cart cleared");
    Ok(Json(CartSummary::from(&*cart)))
}

/// Adds one unit of the scanned product.
pub async fn scan(
    State(state): State<SharedState>,
    Path(terminal): Path<String>,
    Json(req): Json<ScanRequest>,
) -> ApiResult<Json<CartSummary>> {
    let code = req.barcode.trim();
    let product = state
        .db
        .products()
        .get_by_barcode(code)
        .await?
        .ok_or_else(|| ApiError::not_found("Barcode", code))?;

    let cart = state.carts.cart(&terminal).await?;
    let mut cart = cart.lock().await;
    let line = cart.add_product(&product)?;
    debug!(%terminal, product_id = product.id, qty = line.quantity, "Scanned");
    Ok(Json(CartSummary::from(&*cart)))
}

/// Adds one unit of a product picked from the list.
pub async fn add_item(
    State(state): State<SharedState>,
    Path(terminal): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> ApiResult<Json<CartSummary>> {
    let product = load_product(&state, req.product_id).await?;

    let cart = state.carts.cart(&terminal).await?;
    let mut cart = cart.lock().await;
    let line = cart.add_product(&product)?;
    debug!(%terminal, product_id = product.id, qty = line.quantity, "Added to cart");
    Ok(Json(CartSummary::from(&*cart)))
}

/// +1, only while the cart holds less than the shelf.
pub async fn increase(
    State(state): State<SharedState>,
    Path((terminal, product_id)): Path<(String, i64)>,
) -> ApiResult<Json<CartSummary>> {
    let product = load_product(&state, product_id).await?;

    let cart = state.carts.cart(&terminal).await?;
    let mut cart = cart.lock().await;
    cart.increase(product_id, product.quantity)?;
    Ok(Json(CartSummary::from(&*cart)))
}

/// −1; the line disappears at zero.
pub async fn decrease(
    State(state): State<SharedState>,
    Path((terminal, product_id)): Path<(String, i64)>,
) -> ApiResult<Json<CartSummary>> {
    let cart = state.carts.cart(&terminal).await?;
    let mut cart = cart.lock().await;
    cart.decrease(product_id)?;
    Ok(Json(CartSummary::from(&*cart)))
}

pub async fn remove_item(
    State(state): State<SharedState>,
    Path((terminal, product_id)): Path<(String, i64)>,
) -> ApiResult<Json<CartSummary>> {
    let cart = state.carts.cart(&terminal).await?;
    let mut cart = cart.lock().await;
    cart.remove(product_id)?;
    Ok(Json(CartSummary::from(&*cart)))
}

/// Selects the bill discount, replacing any earlier one.
pub async fn apply_discount(
    State(state): State<SharedState>,
    Path(terminal): Path<String>,
    Json(req): Json<ApplyDiscountRequest>,
) -> ApiResult<Json<CartSummary>> {
    let discount = state
        .db
        .discounts()
        .get(req.discount_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Discount", req.discount_id))?;

    let cart = state.carts.cart(&terminal).await?;
    let mut cart = cart.lock().await;
    cart.apply_discount(discount);
    Ok(Json(CartSummary::from(&*cart)))
}

pub async fn clear_discount(
    State(state): State<SharedState>,
    Path(terminal): Path<String>,
) -> ApiResult<Json<CartSummary>> {
    let cart = state.carts.cart(&terminal).await?;
    let mut cart = cart.lock().await;
    cart.clear_discount();
    Ok(Json(CartSummary::from(&*cart)))
}
