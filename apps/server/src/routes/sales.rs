//! # Checkout, Returns and Bill History
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /carts/{terminal}/checkout { "payment_method": "cash" }          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  lock terminal cart ─► cart.to_checkout(method, x-user-id)             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  db.checkout().checkout()      one transaction: bill no, lines, stock   │
//! │         │ ok                          │ err                             │
//! │         ▼                             ▼                                 │
//! │  cart.clear()                  cart untouched, error returned           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  print receipt ─── fails ──► printed: false + print_warning            │
//! │         │                    (the sale stays committed)                 │
//! │         ▼                                                               │
//! │  201 { bill, printed, print_warning }                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shopfloor_core::receipt::Receipt;
use shopfloor_core::{BillSummary, CompletedBill, NewReturn, ReturnRecord};
use tracing::{info, warn};

use crate::auth::Actor;
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, SharedState};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

impl LimitQuery {
    fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutBody {
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub bill: CompletedBill,
    pub printed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PrintOutcome {
    pub bill_no: i64,
    pub printed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_warning: Option<String>,
}

/// Renders and prints a stored bill. Never fails; problems come back as a
/// warning.
///
/// The printer does blocking I/O, so it runs on the blocking pool.
async fn print_summary(state: &AppState, bill: &BillSummary) -> PrintOutcome {
    let receipt = Receipt::from_bill(state.config.store.header(), bill);
    let printer = Arc::clone(&state.printer);
    let printed = tokio::task::spawn_blocking(move || printer.print(&receipt))
        .await
        .map_err(|e| e.to_string())
        .and_then(|result| result.map_err(|e| e.to_string()));

    match printed {
        Ok(target) => {
            info!(bill_no = bill.bill_no, %target, "Receipt printed");
            PrintOutcome {
                bill_no: bill.bill_no,
                printed: true,
                print_warning: None,
            }
        }
        Err(e) => {
            warn!(bill_no = bill.bill_no, error = %e, "Receipt not printed");
            PrintOutcome {
                bill_no: bill.bill_no,
                printed: false,
                print_warning: Some(format!("Sale saved but receipt not printed: {}", e)),
            }
        }
    }
}

async fn print_committed(state: &AppState, bill_no: i64) -> PrintOutcome {
    match state.db.bills().get(bill_no).await {
        Ok(Some(bill)) => print_summary(state, &bill).await,
        Ok(None) => PrintOutcome {
            bill_no,
            printed: false,
            print_warning: Some(format!("Bill {} could not be reloaded for printing", bill_no)),
        },
        Err(e) => {
            warn!(bill_no, error = %e, "Cannot reload bill for printing");
            PrintOutcome {
                bill_no,
                printed: false,
                print_warning: Some("Sale saved but receipt not printed".to_string()),
            }
        }
    }
}

pub async fn checkout(
    State(state): State<SharedState>,
    Path(terminal): Path<String>,
    actor: Actor,
    Json(body): Json<CheckoutBody>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    let cart = state.carts.cart(&terminal).await?;
    let mut cart = cart.lock().await;

    let request = cart.to_checkout(body.payment_method, actor.user_id());
    let bill = state.db.checkout().checkout(&request).await?;
    cart.clear();
    drop(cart);

    info!(
        %terminal,
        bill_no = bill.bill_no,
        total = bill.total_cents,
        "Checkout committed"
    );

    let outcome = print_committed(&state, bill.bill_no).await;
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            bill,
            printed: outcome.printed,
            print_warning: outcome.print_warning,
        }),
    ))
}

pub async fn record_return(
    State(state): State<SharedState>,
    Json(new): Json<NewReturn>,
) -> ApiResult<(StatusCode, Json<ReturnRecord>)> {
    let record = state.db.returns().record(new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_returns(
    State(state): State<SharedState>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<Json<Vec<ReturnRecord>>> {
    Ok(Json(state.db.returns().list_recent(q.limit()).await?))
}

pub async fn bill_history(
    State(state): State<SharedState>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<Json<Vec<BillSummary>>> {
    Ok(Json(state.db.bills().history(q.limit()).await?))
}

pub async fn get_bill(
    State(state): State<SharedState>,
    Path(bill_no): Path<i64>,
) -> ApiResult<Json<BillSummary>> {
    let bill = state
        .db
        .bills()
        .get(bill_no)
        .await?
        .ok_or_else(|| ApiError::not_found("Bill", bill_no))?;
    Ok(Json(bill))
}

/// Prints a stored bill again.
pub async fn reprint(
    State(state): State<SharedState>,
    Path(bill_no): Path<i64>,
) -> ApiResult<Json<PrintOutcome>> {
    let bill = state
        .db
        .bills()
        .get(bill_no)
        .await?
        .ok_or_else(|| ApiError::not_found("Bill", bill_no))?;
    Ok(Json(print_summary(&state, &bill).await))
}
