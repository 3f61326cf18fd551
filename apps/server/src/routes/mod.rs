//! # HTTP Routes
//!
//! JSON over HTTP. The acting user travels in the `x-user-id` header.
//!
//! ## Route Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  /health                                  liveness + DB                 │
//! │  /users, /login                           accounts                      │
//! │  /categories, /products[/{id}]            catalog                       │
//! │  /products/{id}/barcode.svg               barcode image                 │
//! │  /products/{id}/stock                     stock correction (admin)      │
//! │  /discounts                               bill discounts                │
//! │  /carts/{terminal}/...                    per-terminal cart             │
//! │  /carts/{terminal}/checkout               bill + receipt                │
//! │  /returns                                 returns                       │
//! │  /bills[/{bill_no}[/print]]               history, re-print             │
//! │  /analytics/...                           reports + CSV                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod analytics;
mod carts;
mod catalog;
mod health;
mod sales;
mod users;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

/// Builds the application router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Accounts
        .route("/users", post(users::register))
        .route("/login", post(users::login))
        // Catalog
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route("/products/{id}/barcode.svg", get(catalog::barcode_image))
        .route("/products/{id}/stock", post(catalog::adjust_stock))
        .route(
            "/discounts",
            get(catalog::list_discounts).post(catalog::create_discount),
        )
        // Carts
        .route(
            "/carts/{terminal}",
            get(carts::get_cart).delete(carts::clear_cart),
        )
        .route("/carts/{terminal}/scan", post(carts::scan))
        .route("/carts/{terminal}/items", post(carts::add_item))
        .route(
            "/carts/{terminal}/items/{product_id}",
            axum::routing::delete(carts::remove_item),
        )
        .route(
            "/carts/{terminal}/items/{product_id}/increase",
            post(carts::increase),
        )
        .route(
            "/carts/{terminal}/items/{product_id}/decrease",
            post(carts::decrease),
        )
        .route(
            "/carts/{terminal}/discount",
            put(carts::apply_discount).delete(carts::clear_discount),
        )
        .route("/carts/{terminal}/checkout", post(sales::checkout))
        // Returns and history
        .route(
            "/returns",
            get(sales::list_returns).post(sales::record_return),
        )
        .route("/bills", get(sales::bill_history))
        .route("/bills/{bill_no}", get(sales::get_bill))
        .route("/bills/{bill_no}/print", post(sales::reprint))
        // Analytics
        .route("/analytics/range", get(analytics::range_report))
        .route("/analytics/range/export", get(analytics::range_export))
        .route("/analytics/periods/{period}", get(analytics::period_report))
        .route("/analytics/best-sellers", get(analytics::best_sellers))
        .route("/analytics/unsold", get(analytics::unsold))
        .route("/analytics/products", get(analytics::product_summary))
        .route(
            "/analytics/products/export",
            get(analytics::product_summary_export),
        )
        .with_state(state)
}

// =============================================================================
// Router Tests
// =============================================================================
