//! Reports and their CSV exports.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use shopfloor_core::analytics::{
    BestSeller, DateRange, Period, PeriodTotals, ProductSummaryRow, RangeReport, UnsoldProduct,
};

use crate::error::ApiResult;
use crate::export::{self, ExportSection};
use crate::state::SharedState;

const DEFAULT_BEST_SELLERS: u32 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeExportQuery {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub section: ExportSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct BestSellerQuery {
    pub limit: Option<u32>,
}

fn csv_attachment(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn range_report(
    State(state): State<SharedState>,
    Query(q): Query<RangeQuery>,
) -> ApiResult<Json<RangeReport>> {
    let range = DateRange::parse(&q.from, &q.to)?;
    Ok(Json(state.db.analytics().range_report(range).await?))
}

pub async fn range_export(
    State(state): State<SharedState>,
    Query(q): Query<RangeExportQuery>,
) -> ApiResult<Response> {
    let range = DateRange::parse(&q.from, &q.to)?;
    let report = state.db.analytics().range_report(range).await?;
    let body = export::range_section_csv(&report, q.section)?;
    let filename = format!("sales-{}-{}-{}.csv", q.section.as_str(), range.from, range.to);
    Ok(csv_attachment(&filename, body))
}

/// `daily` (last 7 days), `weekly` (last 4 weeks), `monthly` (last 12
/// months) or `yearly` (every year with sales).
pub async fn period_report(
    State(state): State<SharedState>,
    Path(period): Path<String>,
) -> ApiResult<Json<Vec<PeriodTotals>>> {
    let period: Period = period.parse()?;
    Ok(Json(state.db.analytics().period_report(period).await?))
}

pub async fn best_sellers(
    State(state): State<SharedState>,
    Query(q): Query<BestSellerQuery>,
) -> ApiResult<Json<Vec<BestSeller>>> {
    let limit = q.limit.unwrap_or(DEFAULT_BEST_SELLERS).clamp(1, 100);
    Ok(Json(state.db.analytics().best_sellers(limit).await?))
}

pub async fn unsold(State(state): State<SharedState>) -> ApiResult<Json<Vec<UnsoldProduct>>> {
    Ok(Json(state.db.analytics().unsold_products().await?))
}

pub async fn product_summary(
    State(state): State<SharedState>,
) -> ApiResult<Json<Vec<ProductSummaryRow>>> {
    Ok(Json(state.db.analytics().product_summary().await?))
}

pub async fn product_summary_export(State(state): State<SharedState>) -> ApiResult<Response> {
    let rows = state.db.analytics().product_summary().await?;
    let body = export::product_summary_csv(&rows)?;
    Ok(csv_attachment("product-summary.csv", body))
}
