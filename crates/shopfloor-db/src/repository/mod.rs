//! # Repository Module
//!
//! Database repository implementations for Shopfloor.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Transactions                        │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.checkout().checkout(&request)                              │
//! │       ▼                                                                 │
//! │  CheckoutRepository / ReturnRepository     (own the transaction)       │
//! │       │                                                                 │
//! │       ├── sequence::issue(&mut tx)          bill numbers               │
//! │       └── inventory::decrement/increment    guarded stock moves        │
//! │                                                                         │
//! │  Catalog: CategoryRepository, ProductRepository, DiscountRepository,   │
//! │           UserRepository                                                │
//! │  Reads:   BillRepository, AnalyticsRepository                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `sequence` and `inventory` expose free functions over a borrowed
//! connection so they always run inside the caller's transaction.

pub mod analytics;
pub mod bills;
pub mod category;
pub mod checkout;
pub mod discount;
pub mod inventory;
pub mod product;
pub mod returns;
pub mod sequence;
pub mod user;
