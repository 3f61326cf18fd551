//! # Shopfloor Server
//!
//! HTTP JSON API over `shopfloor-core` and `shopfloor-db`.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Server Modules                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  routes        │  │  state         │  │  auth                      ││
//! │  │                │  │                │  │                            ││
//! │  │ • catalog      │  │ • AppState     │  │ • argon2 hash / verify     ││
//! │  │ • carts        │  │ • CartStore    │  │ • Actor (x-user-id)        ││
//! │  │ • sales        │  │                │  │ • require_admin            ││
//! │  │ • analytics    │  │                │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  barcode       │  │  printer       │  │  export                    ││
//! │  │  Code 128 SVG  │  │  receipt spool │  │  CSV reports               ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  config (TOML + SHOPFLOOR_* env)     error (ApiError → JSON + status)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. Every file setting has a `SHOPFLOOR_*` environment
//! override, e.g. `SHOPFLOOR_PORT`, `SHOPFLOOR_DB_PATH`.

pub mod auth;
pub mod barcode;
pub mod config;
pub mod error;
pub mod export;
pub mod files;
pub mod printer;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::router;
pub use state::{AppState, SharedState};
