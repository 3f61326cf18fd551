//! # CSV Export
//!
//! Serialises reports that were already computed by the analytics
//! repository. Money columns are plain decimals (`12.50`).
//!
//! | Section        | Source                               |
//! |----------------|--------------------------------------|
//! | `summary`      | `RangeReport` headline figures       |
//! | `top_qty`      | `RangeReport::top_by_net_qty`        |
//! | `top_revenue`  | `RangeReport::top_by_gross_revenue`  |
//! | products       | `product_summary()`                  |

use serde::{Deserialize, Serialize};
use shopfloor_core::analytics::{ProductSummaryRow, RangeReport, TopSeller};
use shopfloor_core::Money;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV writer error: {0}")]
    Flush(String),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Which part of a range report to export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportSection {
    #[default]
    Summary,
    TopQty,
    TopRevenue,
}

impl ExportSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportSection::Summary => "summary",
            ExportSection::TopQty => "top_qty",
            ExportSection::TopRevenue => "top_revenue",
        }
    }
}

fn to_csv<T: Serialize>(rows: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

fn money(cents: i64) -> String {
    Money::from_cents(cents).to_string()
}

#[derive(Serialize)]
struct MetricRow {
    metric: &'static str,
    value: String,
}

#[derive(Serialize)]
struct TopSellerRow<'a> {
    product_id: i64,
    name: &'a str,
    gross_sold_qty: i64,
    returned_qty: i64,
    net_sold_qty: i64,
    gross_revenue: String,
}

#[derive(Serialize)]
struct ProductRow<'a> {
    product_id: i64,
    name: &'a str,
    barcode: &'a str,
    category: &'a str,
    cost_price: String,
    selling_price: String,
    current_stock: i64,
    units_sold: i64,
    units_returned: i64,
    net_units: i64,
    revenue: String,
    gross_profit: String,
}

/// One `metric,value` row per headline figure.
pub fn range_summary_csv(report: &RangeReport) -> Result<String, ExportError> {
    let rows = vec![
        MetricRow { metric: "from", value: report.range.from.to_string() },
        MetricRow { metric: "to", value: report.range.to.to_string() },
        MetricRow { metric: "gross_sales", value: money(report.gross_sales_cents) },
        MetricRow { metric: "total_discount", value: money(report.total_discount_cents) },
        MetricRow { metric: "returns_value", value: money(report.returns_value_cents) },
        MetricRow { metric: "net_sales", value: money(report.net_sales_cents) },
        MetricRow { metric: "number_of_bills", value: report.number_of_bills.to_string() },
        MetricRow { metric: "total_items_sold", value: report.total_items_sold.to_string() },
        MetricRow { metric: "avg_items_per_bill", value: format!("{:.2}", report.avg_items_per_bill) },
        MetricRow { metric: "avg_bill_value_net", value: money(report.avg_bill_value_net_cents) },
        MetricRow { metric: "cost_of_gross_sales", value: money(report.cost_of_gross_sales_cents) },
        MetricRow { metric: "cost_of_returned_goods", value: money(report.cost_of_returned_goods_cents) },
        MetricRow { metric: "net_cogs", value: money(report.net_cogs_cents) },
        MetricRow { metric: "estimated_profit", value: money(report.estimated_profit_cents) },
    ];
    to_csv(&rows)
}

pub fn top_sellers_csv(sellers: &[TopSeller]) -> Result<String, ExportError> {
    let rows: Vec<TopSellerRow<'_>> = sellers
        .iter()
        .map(|s| TopSellerRow {
            product_id: s.product_id,
            name: &s.name,
            gross_sold_qty: s.gross_sold_qty,
            returned_qty: s.returned_qty,
            net_sold_qty: s.net_sold_qty,
            gross_revenue: money(s.gross_revenue_cents),
        })
        .collect();
    to_csv(&rows)
}

/// The section of a range report the caller asked for.
pub fn range_section_csv(report: &RangeReport, section: ExportSection) -> Result<String, ExportError> {
    match section {
        ExportSection::Summary => range_summary_csv(report),
        ExportSection::TopQty => top_sellers_csv(&report.top_by_net_qty),
        ExportSection::TopRevenue => top_sellers_csv(&report.top_by_gross_revenue),
    }
}

pub fn product_summary_csv(rows: &[ProductSummaryRow]) -> Result<String, ExportError> {
    let rows: Vec<ProductRow<'_>> = rows
        .iter()
        .map(|r| ProductRow {
            product_id: r.product_id,
            name: &r.name,
            barcode: &r.barcode,
            category: &r.category_name,
            cost_price: money(r.cost_price_cents),
            selling_price: money(r.selling_price_cents),
            current_stock: r.current_stock,
            units_sold: r.units_sold,
            units_returned: r.units_returned,
            net_units: r.net_units,
            revenue: money(r.revenue_cents),
            gross_profit: money(r.gross_profit_cents),
        })
        .collect();
    to_csv(&rows)
}
