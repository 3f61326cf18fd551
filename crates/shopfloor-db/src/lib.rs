//! # shopfloor-db: Database Layer for Shopfloor
//!
//! This crate provides database access for the Shopfloor store backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfloor Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /carts/{terminal}/checkout)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  shopfloor-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Checkout      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Returns       │    │ 001_initial  │  │   │
//! │  │   │ WAL + busy    │    │ BillSequence  │    │  _schema.sql │  │   │
//! │  │   │   timeout     │    │ Analytics ... │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/pos/shopfloor.db (or the configured path)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repositories and the two money-moving transactions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopfloor_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shopfloor.db")).await?;
//!
//! let bill = db.checkout().checkout(&cart.to_checkout(Some("cash".into()), None)).await?;
//! let report = db.analytics().range_report(range).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::analytics::AnalyticsRepository;
pub use repository::bills::BillRepository;
pub use repository::category::CategoryRepository;
pub use repository::checkout::CheckoutRepository;
pub use repository::discount::DiscountRepository;
pub use repository::product::ProductRepository;
pub use repository::returns::ReturnRepository;
pub use repository::sequence::BillSequence;
pub use repository::user::UserRepository;

// =============================================================================
// Test Fixtures
// =============================================================================
