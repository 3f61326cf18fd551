//! # Analytics
//!
//! Pure arithmetic behind the sales reports. The SQL that gathers raw sums
//! lives in `shopfloor-db`; everything derived from those sums lives here
//! so it can be tested without a database.
//!
//! ## Report Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Range Report                                       │
//! │                                                                         │
//! │  RangeTotals (raw sums from SQL)                                        │
//! │  ├── gross          Σ qty × unit price over sale lines                  │
//! │  ├── discounts      Σ bills.discount (one per bill)                     │
//! │  ├── returns        Σ qty × refund price over returns                   │
//! │  ├── cost_of_gross  Σ qty × CURRENT cost over sale lines                │
//! │  └── cost_of_returns Σ qty × CURRENT cost over returns                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  net       = gross - discounts - returns                                 │
//! │  net_cogs  = cost_of_gross - cost_of_returns                            │
//! │  profit    = net - net_cogs                                             │
//! │  averages  = per bill, 0 when there are no bills                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Known Limitation
//! Cost price is not versioned. Every cost figure uses the product's cost
//! as it is today, also for sales made before a cost change.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;
use crate::UNCATEGORIZED;

const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive range of calendar dates (UTC).
///
/// ## Example
/// ```rust
/// use shopfloor_core::analytics::DateRange;
///
/// let range = DateRange::parse("2024-03-01", "2024-03-31").unwrap();
/// let (start, end) = range.bounds();
/// assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
/// assert_eq!(end.to_rfc3339(), "2024-04-01T00:00:00+00:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range, refusing `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> ValidationResult<Self> {
        if from > to {
            return Err(ValidationError::invalid_format(
                "to",
                "end date is before start date",
            ));
        }
        Ok(DateRange { from, to })
    }

    /// Parses two `YYYY-MM-DD` dates.
    pub fn parse(from: &str, to: &str) -> ValidationResult<Self> {
        let from = parse_date("from", from)?;
        let to = parse_date("to", to)?;
        Self::new(from, to)
    }

    /// A range covering one day.
    pub fn day(date: NaiveDate) -> Self {
        DateRange { from: date, to: date }
    }

    /// Half-open UTC instants `[from 00:00, to+1 00:00)` for SQL bounds.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self
            .to
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX);
        (midnight(self.from), midnight(end))
    }

    /// Number of days covered.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ValidationError::invalid_format(field, "expected YYYY-MM-DD"))
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Periods
// =============================================================================

/// Preset reporting periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Last 7 days, today first.
    Daily,
    /// Last 4 ISO weeks (Monday start), this week first.
    Weekly,
    /// Last 12 calendar months, this month first.
    Monthly,
    /// Every year that has sales, newest first.
    Yearly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }

    /// Fixed buckets ending at `today`, newest first.
    ///
    /// `Yearly` is driven by the data and returns no fixed buckets; see
    /// [`PeriodBucket::year`].
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use shopfloor_core::analytics::Period;
    ///
    /// // 2024-03-13 is a Wednesday
    /// let today = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
    /// let weeks = Period::Weekly.buckets(today);
    /// assert_eq!(weeks.len(), 4);
    /// assert_eq!(weeks[0].label, "2024-03-11");
    /// assert_eq!(weeks[0].range.to.to_string(), "2024-03-17");
    /// ```
    pub fn buckets(&self, today: NaiveDate) -> Vec<PeriodBucket> {
        match self {
            Period::Daily => (0..7)
                .filter_map(|i| today.checked_sub_days(Days::new(i)))
                .map(|d| PeriodBucket {
                    label: d.format(DATE_FORMAT).to_string(),
                    range: DateRange::day(d),
                })
                .collect(),
            Period::Weekly => {
                let monday = today
                    .checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_monday())))
                    .unwrap_or(today);
                (0..4)
                    .filter_map(|i| monday.checked_sub_days(Days::new(7 * i)))
                    .map(|start| {
                        let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
                        PeriodBucket {
                            label: start.format(DATE_FORMAT).to_string(),
                            range: DateRange { from: start, to: end },
                        }
                    })
                    .collect()
            }
            Period::Monthly => {
                let first = today.with_day(1).unwrap_or(today);
                (0..12)
                    .filter_map(|i| first.checked_sub_months(Months::new(i)))
                    .map(|start| {
                        let end = start
                            .checked_add_months(Months::new(1))
                            .and_then(|next| next.pred_opt())
                            .unwrap_or(start);
                        PeriodBucket {
                            label: start.format("%Y-%m").to_string(),
                            range: DateRange { from: start, to: end },
                        }
                    })
                    .collect()
            }
            Period::Yearly => Vec::new(),
        }
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "yearly" => Ok(Period::Yearly),
            _ => Err(ValidationError::NotAllowed {
                field: "period".to_string(),
                allowed: ["daily", "weekly", "monthly", "yearly"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled bucket of a period report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodBucket {
    pub label: String,
    pub range: DateRange,
}

impl PeriodBucket {
    /// The calendar year `year`, labelled `"2024"`.
    pub fn year(year: i32) -> Option<Self> {
        let from = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let to = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(PeriodBucket {
            label: year.to_string(),
            range: DateRange { from, to },
        })
    }
}

/// Sales figures for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodTotals {
    pub label: String,
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
    pub gross_cents: i64,
    pub discount_cents: i64,
    pub returns_cents: i64,
    pub net_cents: i64,
}

impl PeriodTotals {
    pub fn new(bucket: PeriodBucket, gross: Money, discounts: Money, returns: Money) -> Self {
        PeriodTotals {
            label: bucket.label,
            start: bucket.range.from,
            end: bucket.range.to,
            gross_cents: gross.cents(),
            discount_cents: discounts.cents(),
            returns_cents: returns.cents(),
            net_cents: (gross - discounts - returns).cents(),
        }
    }
}

// =============================================================================
// Range Report
// =============================================================================

/// Raw sums for a date range, as gathered by SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeTotals {
    pub gross: Money,
    pub discounts: Money,
    pub returns: Money,
    pub number_of_bills: i64,
    pub total_items_sold: i64,
    pub cost_of_gross_sales: Money,
    pub cost_of_returned_goods: Money,
}

/// Per-product movement inside a date range.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TopSeller {
    pub product_id: i64,
    pub name: String,
    pub gross_sold_qty: i64,
    pub returned_qty: i64,
    pub net_sold_qty: i64,
    pub gross_revenue_cents: i64,
}

impl TopSeller {
    pub fn new(product_id: i64, name: String, gross_sold_qty: i64, returned_qty: i64, gross_revenue: Money) -> Self {
        TopSeller {
            product_id,
            name,
            gross_sold_qty,
            returned_qty,
            net_sold_qty: gross_sold_qty - returned_qty,
            gross_revenue_cents: gross_revenue.cents(),
        }
    }
}

/// Top `limit` by net quantity, ties by product id.
pub fn rank_by_net_qty(sellers: &[TopSeller], limit: usize) -> Vec<TopSeller> {
    let mut ranked = sellers.to_vec();
    ranked.sort_by(|a, b| {
        b.net_sold_qty
            .cmp(&a.net_sold_qty)
            .then(a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Top `limit` by gross revenue, ties by product id.
pub fn rank_by_gross_revenue(sellers: &[TopSeller], limit: usize) -> Vec<TopSeller> {
    let mut ranked = sellers.to_vec();
    ranked.sort_by(|a, b| {
        b.gross_revenue_cents
            .cmp(&a.gross_revenue_cents)
            .then(a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Detailed report for an explicit date range.
///
/// Cost figures use current cost prices. See the module docs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RangeReport {
    pub range: DateRange,
    pub gross_sales_cents: i64,
    pub total_discount_cents: i64,
    pub returns_value_cents: i64,
    pub net_sales_cents: i64,
    pub number_of_bills: i64,
    pub total_items_sold: i64,
    /// Two decimals.
    pub avg_items_per_bill: f64,
    pub avg_bill_value_net_cents: i64,
    pub cost_of_gross_sales_cents: i64,
    pub cost_of_returned_goods_cents: i64,
    pub net_cogs_cents: i64,
    pub estimated_profit_cents: i64,
    pub top_by_net_qty: Vec<TopSeller>,
    pub top_by_gross_revenue: Vec<TopSeller>,
}

impl RangeReport {
    /// Derives the report from raw sums and the per-product movements.
    ///
    /// ## Example
    /// ```rust
    /// use shopfloor_core::analytics::{DateRange, RangeReport, RangeTotals};
    /// use shopfloor_core::money::Money;
    ///
    /// let totals = RangeTotals {
    ///     gross: Money::from_cents(2000),
    ///     discounts: Money::from_cents(200),
    ///     number_of_bills: 1,
    ///     total_items_sold: 2,
    ///     ..Default::default()
    /// };
    /// let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
    /// let report = RangeReport::build(range, totals, &[], 5);
    /// assert_eq!(report.net_sales_cents, 1800);
    /// ```
    pub fn build(range: DateRange, totals: RangeTotals, sellers: &[TopSeller], top_n: usize) -> Self {
        let net = totals.gross - totals.discounts - totals.returns;
        let net_cogs = totals.cost_of_gross_sales - totals.cost_of_returned_goods;
        let avg_items_per_bill = if totals.number_of_bills > 0 {
            let avg = totals.total_items_sold as f64 / totals.number_of_bills as f64;
            (avg * 100.0).round() / 100.0
        } else {
            0.0
        };

        RangeReport {
            range,
            gross_sales_cents: totals.gross.cents(),
            total_discount_cents: totals.discounts.cents(),
            returns_value_cents: totals.returns.cents(),
            net_sales_cents: net.cents(),
            number_of_bills: totals.number_of_bills,
            total_items_sold: totals.total_items_sold,
            avg_items_per_bill,
            avg_bill_value_net_cents: net.average_over(totals.number_of_bills).cents(),
            cost_of_gross_sales_cents: totals.cost_of_gross_sales.cents(),
            cost_of_returned_goods_cents: totals.cost_of_returned_goods.cents(),
            net_cogs_cents: net_cogs.cents(),
            estimated_profit_cents: (net - net_cogs).cents(),
            top_by_net_qty: rank_by_net_qty(sellers, top_n),
            top_by_gross_revenue: rank_by_gross_revenue(sellers, top_n),
        }
    }
}

// =============================================================================
// Product Listings
// =============================================================================

/// All-time best seller by gross units, with profit at current prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BestSeller {
    pub product_id: i64,
    pub name: String,
    pub total_sold: i64,
    pub selling_price_cents: i64,
    pub cost_price_cents: i64,
    pub profit_cents: i64,
}

impl BestSeller {
    pub fn new(product_id: i64, name: String, total_sold: i64, selling: Money, cost: Money) -> Self {
        BestSeller {
            product_id,
            name,
            total_sold,
            selling_price_cents: selling.cents(),
            cost_price_cents: cost.cents(),
            profit_cents: (selling - cost).multiply_quantity(total_sold).cents(),
        }
    }
}

/// A product that has never been sold.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnsoldProduct {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub selling_price_cents: i64,
    pub cost_price_cents: i64,
    pub category_name: String,
}

/// Lifetime totals for one product, as gathered by SQL.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTotals {
    pub product_id: i64,
    pub name: String,
    pub barcode: String,
    pub category_name: Option<String>,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub current_stock: i64,
    pub units_sold: i64,
    pub units_returned: i64,
    pub revenue_cents: i64,
}

/// One row of the product summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSummaryRow {
    pub product_id: i64,
    pub name: String,
    pub barcode: String,
    pub category_name: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub current_stock: i64,
    pub units_sold: i64,
    pub units_returned: i64,
    pub net_units: i64,
    pub revenue_cents: i64,
    /// Revenue minus current cost × gross units.
    pub gross_profit_cents: i64,
}

impl From<ProductTotals> for ProductSummaryRow {
    fn from(t: ProductTotals) -> Self {
        let cost_of_sold = Money::from_cents(t.cost_price_cents).multiply_quantity(t.units_sold);
        ProductSummaryRow {
            gross_profit_cents: (Money::from_cents(t.revenue_cents) - cost_of_sold).cents(),
            net_units: t.units_sold - t.units_returned,
            category_name: t
                .category_name
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            product_id: t.product_id,
            name: t.name,
            barcode: t.barcode,
            cost_price_cents: t.cost_price_cents,
            selling_price_cents: t.selling_price_cents,
            current_stock: t.current_stock,
            units_sold: t.units_sold,
            units_returned: t.units_returned,
            revenue_cents: t.revenue_cents,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_parse() {
        let range = DateRange::parse("2024-01-05", " 2024-01-07 ").unwrap();
        assert_eq!(range.days(), 3);

        assert!(DateRange::parse("2024-01-07", "2024-01-05").is_err());
        assert!(DateRange::parse("05/01/2024", "2024-01-07").is_err());
        assert_eq!(
            DateRange::parse("", "2024-01-07").unwrap_err(),
            ValidationError::required("from")
        );
    }

    #[test]
    fn test_bounds_are_half_open() {
        let (start, end) = DateRange::day(date(2024, 2, 29)).bounds();
        assert_eq!(start.to_rfc3339(), "2024-02-29T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_daily_buckets() {
        let buckets = Period::Daily.buckets(date(2024, 3, 2));
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].label, "2024-03-02");
        assert_eq!(buckets[1].label, "2024-03-01");
        assert_eq!(buckets[6].label, "2024-02-25");
    }

    #[test]
    fn test_weekly_buckets_start_on_monday() {
        // Sunday
        let buckets = Period::Weekly.buckets(date(2024, 3, 17));
        assert_eq!(buckets[0].range.from, date(2024, 3, 11));
        assert_eq!(buckets[0].range.to, date(2024, 3, 17));
        assert_eq!(buckets[3].range.from, date(2024, 2, 19));
    }

    #[test]
    fn test_monthly_buckets_cross_year() {
        let buckets = Period::Monthly.buckets(date(2024, 2, 15));
        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].label, "2024-02");
        assert_eq!(buckets[0].range.to, date(2024, 2, 29));
        assert_eq!(buckets[1].label, "2024-01");
        assert_eq!(buckets[2].label, "2023-12");
        assert_eq!(buckets[2].range.to, date(2023, 12, 31));
        assert_eq!(buckets[11].label, "2023-03");
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("Weekly".parse::<Period>().unwrap(), Period::Weekly);
        assert!("hourly".parse::<Period>().is_err());
        assert!(Period::Yearly.buckets(date(2024, 1, 1)).is_empty());
        assert_eq!(PeriodBucket::year(2023).unwrap().range.to, date(2023, 12, 31));
    }

    #[test]
    fn test_period_totals_net() {
        let bucket = PeriodBucket::year(2024).unwrap();
        let totals = PeriodTotals::new(
            bucket,
            Money::from_cents(2000),
            Money::from_cents(200),
            Money::from_cents(1800),
        );
        assert_eq!(totals.net_cents, 0);
        assert_eq!(totals.label, "2024");
    }

    #[test]
    fn test_range_report_identity() {
        let totals = RangeTotals {
            gross: Money::from_cents(2000),
            discounts: Money::from_cents(200),
            returns: Money::from_cents(900),
            number_of_bills: 3,
            total_items_sold: 4,
            cost_of_gross_sales: Money::from_cents(1200),
            cost_of_returned_goods: Money::from_cents(600),
        };
        let range = DateRange::day(date(2024, 1, 1));
        let report = RangeReport::build(range, totals, &[], 5);

        assert_eq!(report.net_sales_cents, 900);
        assert_eq!(
            report.net_sales_cents,
            report.gross_sales_cents - report.total_discount_cents - report.returns_value_cents
        );
        assert_eq!(report.net_cogs_cents, 600);
        assert_eq!(report.estimated_profit_cents, 300);
        assert_eq!(report.avg_items_per_bill, 1.33);
        assert_eq!(report.avg_bill_value_net_cents, 300);
    }

    #[test]
    fn test_range_report_without_bills() {
        let report = RangeReport::build(DateRange::day(date(2024, 1, 1)), RangeTotals::default(), &[], 5);
        assert_eq!(report.avg_items_per_bill, 0.0);
        assert_eq!(report.avg_bill_value_net_cents, 0);
        assert!(report.top_by_net_qty.is_empty());
    }

    #[test]
    fn test_ranking_ties_break_by_id() {
        let sellers = vec![
            TopSeller::new(3, "C".into(), 5, 0, Money::from_cents(500)),
            TopSeller::new(1, "A".into(), 6, 1, Money::from_cents(900)),
            TopSeller::new(2, "B".into(), 2, 0, Money::from_cents(900)),
        ];

        let by_qty = rank_by_net_qty(&sellers, 5);
        assert_eq!(
            by_qty.iter().map(|s| s.product_id).collect::<Vec<_>>(),
            vec![1, 3, 2]
        );

        let by_revenue = rank_by_gross_revenue(&sellers, 2);
        assert_eq!(
            by_revenue.iter().map(|s| s.product_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_best_seller_profit() {
        let best = BestSeller::new(1, "Widget".into(), 3, Money::from_cents(1000), Money::from_cents(600));
        assert_eq!(best.profit_cents, 1200);
    }

    #[test]
    fn test_product_summary_row() {
        let row = ProductSummaryRow::from(ProductTotals {
            product_id: 1,
            name: "Widget".into(),
            barcode: "100000000000".into(),
            category_name: None,
            cost_price_cents: 600,
            selling_price_cents: 1000,
            current_stock: 4,
            units_sold: 3,
            units_returned: 2,
            revenue_cents: 3000,
        });
        assert_eq!(row.net_units, 1);
        assert_eq!(row.gross_profit_cents, 1200);
        assert_eq!(row.category_name, "Uncategorized");
    }
}
