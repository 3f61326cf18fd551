//! # Catalog Handlers
//!
//! Categories, products (with their barcode images) and discounts.
//!
//! ## Product Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. NewProduct::normalized()        400 on bad fields                  │
//! │  2. barcode = supplied (must be free) or next_barcode()                │
//! │  3. render to a staging file next to <barcode_dir>/<barcode>.svg       │
//! │  4. INSERT ── fails ──► delete the staging file, return the error      │
//! │  5. move the staging file to <barcode_dir>/<barcode>.svg               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use shopfloor_core::{
    Category, Discount, NewDiscount, NewProduct, Product, ProductFilter, ProductListing,
    ProductUpdate,
};
use shopfloor_db::DbError;
use tracing::{info, warn};

use crate::auth::Actor;
use crate::barcode::barcode_path;
use crate::error::{ApiError, ApiResult};
use crate::files::{remove_if_exists, staging_path};
use crate::state::SharedState;

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

pub async fn list_categories(State(state): State<SharedState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

pub async fn create_category(
    State(state): State<SharedState>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.db.categories().create(&req.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(
    State(state): State<SharedState>,
    Query(filter): Query<ProductFilter>,
) -> ApiResult<Json<Vec<ProductListing>>> {
    Ok(Json(state.db.products().list(&filter).await?))
}

pub async fn create_product(
    State(state): State<SharedState>,
    Json(new): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let mut new = new.normalized()?;
    let products = state.db.products();

    let code = match new.barcode.take() {
        Some(code) => {
            if !products.barcode_available(&code).await? {
                return Err(DbError::duplicate("barcode", code).into());
            }
            code
        }
        None => products.next_barcode().await?,
    };

    let image = barcode_path(&state.config.files.barcode_dir, &code);
    let staging = staging_path(&image);
    state.barcodes.render(&code, &staging)?;

    new.barcode = Some(code);
    match products.create(new).await {
        Ok(product) => {
            if let Err(e) = std::fs::rename(&staging, &image) {
                warn!(?image, error = %e, "Could not move barcode image into place");
                let _ = remove_if_exists(&staging);
            }
            Ok((StatusCode::CREATED, Json(product)))
        }
        Err(e) => {
            if let Err(rm) = remove_if_exists(&staging) {
                warn!(?staging, error = %rm, "Could not remove barcode image of failed product");
            }
            Err(e.into())
        }
    }
}

pub async fn get_product(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(update): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().update(id, update).await?))
}

/// Admin only. Products with sales or returns are kept.
pub async fn delete_product(
    State(state): State<SharedState>,
    actor: Actor,
    Path(id): Path<i64>,
) -> ApiResult<Json<Product>> {
    let admin = actor.require_admin()?;
    let product = state.db.products().delete(id).await?;

    let image = barcode_path(&state.config.files.barcode_dir, &product.barcode);
    if let Err(e) = remove_if_exists(&image) {
        warn!(?image, error = %e, "Could not remove barcode image");
    }

    info!(product_id = id, by = admin.id, "Product deleted");
    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i64,
}

#[derive(Debug, serde::Serialize)]
pub struct StockLevel {
    pub product_id: i64,
    pub quantity: i64,
}

/// Admin only. Stock count corrections; cannot go below zero.
pub async fn adjust_stock(
    State(state): State<SharedState>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(req): Json<StockAdjustment>,
) -> ApiResult<Json<StockLevel>> {
    actor.require_admin()?;
    let quantity = state.db.products().adjust_stock(id, req.delta).await?;
    Ok(Json(StockLevel {
        product_id: id,
        quantity,
    }))
}

/// Serves the barcode image, rendering it again if the file is missing.
pub async fn barcode_image(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let product = state
        .db
        .products()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    let image = barcode_path(&state.config.files.barcode_dir, &product.barcode);
    if !image.exists() {
        warn!(product_id = id, ?image, "Barcode image missing, rendering again");
        state.barcodes.render(&product.barcode, &image)?;
    }

    let bytes = std::fs::read(&image).map_err(|e| {
        tracing::error!(?image, error = %e, "Cannot read barcode image");
        ApiError::internal("Cannot read barcode image")
    })?;

    Ok(([(header::CONTENT_TYPE, state.barcodes.content_type())], bytes).into_response())
}

// =============================================================================
// Discounts
// =============================================================================

pub async fn list_discounts(State(state): State<SharedState>) -> ApiResult<Json<Vec<Discount>>> {
    Ok(Json(state.db.discounts().list().await?))
}

/// Admin only.
pub async fn create_discount(
    State(state): State<SharedState>,
    actor: Actor,
    Json(new): Json<NewDiscount>,
) -> ApiResult<(StatusCode, Json<Discount>)> {
    actor.require_admin()?;
    let discount = state.db.discounts().create(new).await?;
    Ok((StatusCode::CREATED, Json(discount)))
}
