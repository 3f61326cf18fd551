//! # Application State
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  Router::with_state(Arc<AppState>)                                      │
//! │                              │                                          │
//! │     ┌──────────────┬─────────┼──────────────┬──────────────────┐        │
//! │     ▼              ▼         ▼              ▼                  ▼        │
//! │  Database     ServerConfig  CartStore   ReceiptPrinter  BarcodeRenderer │
//! │  (pool)       (read-only)   terminal →   (spool dir)     (SVG files)    │
//! │                             Mutex<Cart>                                 │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • CartStore: map lock held only to find/insert a terminal's cart;     │
//! │    each cart has its own lock, held across that terminal's checkout    │
//! │  • CartStore is bounded: idle empty carts are evicted to make room     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use shopfloor_core::Cart;
use shopfloor_db::Database;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::barcode::{BarcodeRenderer, Code128Svg};
use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::printer::{ReceiptPrinter, SpoolPrinter};

/// Shared handle passed to every handler.
pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub carts: CartStore,
    pub printer: Arc<dyn ReceiptPrinter>,
    pub barcodes: Arc<dyn BarcodeRenderer>,
}

impl AppState {
    /// State with the file-backed printer and SVG renderer from `config`.
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let printer = Arc::new(SpoolPrinter::new(&config.files.receipt_dir));
        AppState {
            db,
            carts: CartStore::new(config.server.max_terminals),
            config,
            printer,
            barcodes: Arc::new(Code128Svg::default()),
        }
    }

    pub fn with_printer(mut self, printer: Arc<dyn ReceiptPrinter>) -> Self {
        self.printer = printer;
        self
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(self)
    }
}

/// Longest accepted terminal id.
const MAX_TERMINAL_LEN: usize = 64;

/// One cart per terminal, created on first use.
///
/// At most `max_terminals` carts are kept. A cart is idle when it has no
/// lines, no selected discount and no handler holding it; idle carts are
/// evicted when a new terminal needs room.
pub struct CartStore {
    carts: Mutex<HashMap<String, Arc<Mutex<Cart>>>>,
    max_terminals: usize,
}

impl Default for CartStore {
    fn default() -> Self {
        CartStore::new(64)
    }
}

fn is_idle(cart: &Arc<Mutex<Cart>>) -> bool {
    Arc::strong_count(cart) == 1
        && cart
            .try_lock()
            .map(|c| c.is_empty() && c.discount().is_none())
            .unwrap_or(false)
}

impl CartStore {
    pub fn new(max_terminals: usize) -> Self {
        CartStore {
            carts: Mutex::new(HashMap::new()),
            max_terminals,
        }
    }

    /// The cart for `terminal`.
    ///
    /// Terminal ids are 1..=64 characters of `[A-Za-z0-9_-]`.
    ///
    /// ## Errors
    /// - `VALIDATION_ERROR` for a malformed id
    /// - `CART_LIMIT` when every slot holds a cart in use
    pub async fn cart(&self, terminal: &str) -> ApiResult<Arc<Mutex<Cart>>> {
        if terminal.is_empty()
            || terminal.len() > MAX_TERMINAL_LEN
            || !terminal.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ApiError::validation(format!("Invalid terminal id '{}'", terminal)));
        }

        let mut carts = self.carts.lock().await;
        if let Some(cart) = carts.get(terminal) {
            return Ok(Arc::clone(cart));
        }

        if carts.len() >= self.max_terminals {
            let before = carts.len();
            carts.retain(|_, cart| !is_idle(cart));
            debug!(evicted = before - carts.len(), "Evicted idle carts");
        }
        if carts.len() >= self.max_terminals {
            warn!(%terminal, max = self.max_terminals, "No room for another terminal cart");
            return Err(ApiError::new(
                ErrorCode::CartLimit,
                format!("At most {} terminals can hold a cart", self.max_terminals),
            ));
        }

        let cart = Arc::new(Mutex::new(Cart::new()));
        carts.insert(terminal.to_string(), Arc::clone(&cart));
        Ok(cart)
    }

    /// Number of terminals that have touched a cart.
    pub async fn terminals(&self) -> usize {
        self.carts.lock().await.len()
    }
}
