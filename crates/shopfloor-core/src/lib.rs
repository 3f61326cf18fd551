//! # shopfloor-core: Pure Business Logic for Shopfloor
//!
//! This crate holds the store's business rules as pure functions with zero
//! I/O dependencies. Storage lives in `shopfloor-db`, HTTP and files live in
//! the server app.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfloor Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  │   /carts/{terminal}/scan ──► /checkout ──► receipt spool        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shopfloor-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │analytics │ │receipt │  │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │ periods  │ │ layout │  │   │
//! │  │   │  Bill   │ │  cents  │ │CartLine │ │  report  │ │ 48 col │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopfloor-db (Database Layer)                   │   │
//! │  │       bill sequence, inventory ledger, checkout, returns        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Bill, ReturnRecord, Discount, User)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation at the boundary
//! - [`cart`] - The explicit per-terminal cart
//! - [`analytics`] - Report shapes, derived figures and period buckets
//! - [`receipt`] - Plain-text receipt layout
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfloor_core::money::Money;
//! use shopfloor_core::types::{Discount, DiscountKind};
//!
//! let gross = Money::from_cents(2000); // 20.00
//! let ten_off = Discount::new(1, "TENOFF", DiscountKind::Percentage, 1000);
//!
//! assert_eq!(ten_off.amount_for(gross).cents(), 200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod cart;
pub mod error;
pub mod money;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps a checkout transaction short.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Catches typing 1000 instead of 10 at the till.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Highest accepted price in cents (100,000,000.00).
///
/// A full cart at this price still totals well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// How many products the "top sellers" listings return.
pub const TOP_N: usize = 5;

/// Label used wherever a product has no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// First barcode handed out when the catalog has no numeric barcodes yet.
pub const FIRST_GENERATED_BARCODE: u64 = 100_000_000_000;

/// Width of generated numeric barcodes.
pub const GENERATED_BARCODE_DIGITS: usize = 12;
