//! # Analytics Queries
//!
//! Read-only SQL that gathers raw sums for the reports. Everything derived
//! from those sums (net, averages, profit, ranking) is computed by
//! `shopfloor_core::analytics`.
//!
//! ## Time Bounds
//! ```text
//! DateRange 2024-03-01 ..= 2024-03-31
//!      │
//!      ▼  bounds()
//! [2024-03-01T00:00:00+00:00, 2024-04-01T00:00:00+00:00)
//!      │
//!      ▼
//! WHERE sold_at >= ?1 AND sold_at < ?2     (RFC 3339 text compares in order)
//! ```
//!
//! Each query runs on its own, outside any transaction. A report read while
//! a checkout commits may see the bill in one sum and not in another.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shopfloor_core::analytics::{
    BestSeller, DateRange, Period, PeriodBucket, PeriodTotals, ProductSummaryRow, ProductTotals,
    RangeReport, RangeTotals, TopSeller, UnsoldProduct,
};
use shopfloor_core::{Money, TOP_N, UNCATEGORIZED};

#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    pool: SqlitePool,
}

impl AnalyticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AnalyticsRepository { pool }
    }

    /// Detailed report for an explicit date range.
    pub async fn range_report(&self, range: DateRange) -> DbResult<RangeReport> {
        let totals = self.range_totals(range).await?;
        let sellers = self.top_sellers(range).await?;

        debug!(
            from = %range.from,
            to = %range.to,
            bills = totals.number_of_bills,
            products = sellers.len(),
            "Range report gathered"
        );
        Ok(RangeReport::build(range, totals, &sellers, TOP_N))
    }

    /// Preset period report ending today (UTC).
    pub async fn period_report(&self, period: Period) -> DbResult<Vec<PeriodTotals>> {
        self.period_report_at(period, Utc::now().date_naive()).await
    }

    /// Preset period report ending at `today`, newest bucket first.
    pub async fn period_report_at(&self, period: Period, today: NaiveDate) -> DbResult<Vec<PeriodTotals>> {
        let buckets = match period {
            Period::Yearly => self.sales_years().await?,
            _ => period.buckets(today),
        };

        let mut report = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let totals = self.range_totals(bucket.range).await?;
            report.push(PeriodTotals::new(bucket, totals.gross, totals.discounts, totals.returns));
        }
        Ok(report)
    }

    /// All-time best sellers by units sold.
    pub async fn best_sellers(&self, limit: u32) -> DbResult<Vec<BestSeller>> {
        let rows: Vec<(i64, String, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT p.id, p.name, SUM(s.quantity) AS total_sold,
                   p.selling_price_cents, p.cost_price_cents
            FROM sale_lines s
            JOIN products p ON p.id = s.product_id
            GROUP BY p.id, p.name, p.selling_price_cents, p.cost_price_cents
            ORDER BY total_sold DESC, p.id
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, sold, selling, cost)| {
                BestSeller::new(id, name, sold, Money::from_cents(selling), Money::from_cents(cost))
            })
            .collect())
    }

    /// Products that have never appeared on a bill.
    pub async fn unsold_products(&self) -> DbResult<Vec<UnsoldProduct>> {
        let rows = sqlx::query_as(
            r#"
            SELECT p.id AS product_id, p.name, p.quantity,
                   p.selling_price_cents, p.cost_price_cents,
                   COALESCE(c.name, ?1) AS category_name
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE NOT EXISTS (SELECT 1 FROM sale_lines s WHERE s.product_id = p.id)
            ORDER BY p.name COLLATE NOCASE, p.id
            "#,
        )
        .bind(UNCATEGORIZED)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Lifetime movement of every product.
    pub async fn product_summary(&self) -> DbResult<Vec<ProductSummaryRow>> {
        let rows: Vec<ProductTotals> = sqlx::query_as(
            r#"
            SELECT p.id AS product_id, p.name, p.barcode, c.name AS category_name,
                   p.cost_price_cents, p.selling_price_cents, p.quantity AS current_stock,
                   COALESCE((SELECT SUM(s.quantity) FROM sale_lines s WHERE s.product_id = p.id), 0)
                       AS units_sold,
                   COALESCE((SELECT SUM(r.quantity) FROM returns r WHERE r.product_id = p.id), 0)
                       AS units_returned,
                   COALESCE((SELECT SUM(s.quantity * s.unit_price_cents) FROM sale_lines s
                             WHERE s.product_id = p.id), 0)
                       AS revenue_cents
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            ORDER BY p.name COLLATE NOCASE, p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductSummaryRow::from).collect())
    }

    // =========================================================================
    // Raw Sums
    // =========================================================================

    async fn range_totals(&self, range: DateRange) -> DbResult<RangeTotals> {
        let (start, end): (DateTime<Utc>, DateTime<Utc>) = range.bounds();

        let (gross, items, cost_of_gross): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(s.quantity * s.unit_price_cents), 0),
                   COALESCE(SUM(s.quantity), 0),
                   COALESCE(SUM(s.quantity * p.cost_price_cents), 0)
            FROM sale_lines s
            JOIN products p ON p.id = s.product_id
            WHERE s.sold_at >= ?1 AND s.sold_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let (discounts, bills): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(discount_cents), 0), COUNT(*)
            FROM bills
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let (returns, cost_of_returns): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(r.quantity * r.refund_price_cents), 0),
                   COALESCE(SUM(r.quantity * p.cost_price_cents), 0)
            FROM returns r
            JOIN products p ON p.id = r.product_id
            WHERE r.returned_at >= ?1 AND r.returned_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(RangeTotals {
            gross: Money::from_cents(gross),
            discounts: Money::from_cents(discounts),
            returns: Money::from_cents(returns),
            number_of_bills: bills,
            total_items_sold: items,
            cost_of_gross_sales: Money::from_cents(cost_of_gross),
            cost_of_returned_goods: Money::from_cents(cost_of_returns),
        })
    }

    /// Products sold inside the range, with returns inside the same range.
    async fn top_sellers(&self, range: DateRange) -> DbResult<Vec<TopSeller>> {
        let (start, end) = range.bounds();

        let rows: Vec<(i64, String, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT p.id, p.name,
                   SUM(s.quantity) AS gross_sold_qty,
                   COALESCE((SELECT SUM(r.quantity) FROM returns r
                             WHERE r.product_id = p.id
                               AND r.returned_at >= ?1 AND r.returned_at < ?2), 0)
                       AS returned_qty,
                   SUM(s.quantity * s.unit_price_cents) AS gross_revenue_cents
            FROM sale_lines s
            JOIN products p ON p.id = s.product_id
            WHERE s.sold_at >= ?1 AND s.sold_at < ?2
            GROUP BY p.id, p.name
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, sold, returned, revenue)| {
                TopSeller::new(id, name, sold, returned, Money::from_cents(revenue))
            })
            .collect())
    }

    /// One bucket per calendar year that has a bill, newest first.
    async fn sales_years(&self) -> DbResult<Vec<PeriodBucket>> {
        let years: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT substr(created_at, 1, 4) AS year FROM bills ORDER BY year DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(years
            .iter()
            .filter_map(|y| y.parse::<i32>().ok())
            .filter_map(PeriodBucket::year)
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use shopfloor_core::NewReturn;

    fn today_range() -> DateRange {
        DateRange::day(Utc::now().date_naive())
    }

    #[tokio::test]
    async fn test_range_report_discount_counted_once() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 5).await;

        // Two lines on one bill, one discount
        let gadget = testing::product(&db, "Gadget", 500, 5).await;
        db.checkout()
            .checkout(&testing::cash(&[(&widget, 1), (&gadget, 2)], 200))
            .await
            .unwrap();

        let report = db.analytics().range_report(today_range()).await.unwrap();
        assert_eq!(report.gross_sales_cents, 2000);
        assert_eq!(report.total_discount_cents, 200);
        assert_eq!(report.net_sales_cents, 1800);
        assert_eq!(report.number_of_bills, 1);
        assert_eq!(report.total_items_sold, 3);
        assert_eq!(report.avg_items_per_bill, 3.0);
        // Cost is 60% of price in the fixture
        assert_eq!(report.cost_of_gross_sales_cents, 1200);
        assert_eq!(report.estimated_profit_cents, 600);
    }

    #[tokio::test]
    async fn test_range_report_with_returns() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 5).await;
        let gadget = testing::product(&db, "Gadget", 300, 9).await;
        db.checkout()
            .checkout(&testing::cash(&[(&widget, 3), (&gadget, 2)], 0))
            .await
            .unwrap();
        db.returns()
            .record(NewReturn {
                product_id: widget.id,
                quantity: 2,
                refund_price_cents: 900,
                ..Default::default()
            })
            .await
            .unwrap();

        let report = db.analytics().range_report(today_range()).await.unwrap();
        assert_eq!(report.gross_sales_cents, 3600);
        assert_eq!(report.returns_value_cents, 1800);
        assert_eq!(
            report.net_sales_cents,
            report.gross_sales_cents - report.total_discount_cents - report.returns_value_cents
        );
        assert_eq!(report.cost_of_returned_goods_cents, 1200);

        let top = &report.top_by_net_qty;
        assert_eq!(top[0].product_id, gadget.id);
        assert_eq!(top[1].product_id, widget.id);
        assert_eq!(top[1].returned_qty, 2);
        assert_eq!(top[1].net_sold_qty, 1);
        assert_eq!(report.top_by_gross_revenue[0].product_id, widget.id);
    }

    #[tokio::test]
    async fn test_empty_range() {
        let db = testing::memory_db().await;
        let range = DateRange::parse("2020-01-01", "2020-01-31").unwrap();
        let report = db.analytics().range_report(range).await.unwrap();
        assert_eq!(report.number_of_bills, 0);
        assert_eq!(report.avg_bill_value_net_cents, 0);
        assert!(report.top_by_gross_revenue.is_empty());
    }

    #[tokio::test]
    async fn test_period_reports() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 10).await;
        db.checkout()
            .checkout(&testing::cash(&[(&widget, 2)], 100))
            .await
            .unwrap();
        db.checkout()
            .checkout(&testing::cash(&[(&widget, 1)], 0))
            .await
            .unwrap();

        // Move the first bill back to 2023
        let past = "2023-06-01T10:00:00+00:00";
        sqlx::query("UPDATE bills SET created_at = ?1 WHERE bill_no = 1")
            .bind(past)
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("UPDATE sale_lines SET sold_at = ?1 WHERE bill_no = 1")
            .bind(past)
            .execute(db.pool())
            .await
            .unwrap();

        let daily = db.analytics().period_report(Period::Daily).await.unwrap();
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[0].gross_cents, 1000);
        assert_eq!(daily[0].discount_cents, 0);

        let yearly = db.analytics().period_report(Period::Yearly).await.unwrap();
        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[1].label, "2023");
        assert_eq!(yearly[1].gross_cents, 2000);
        assert_eq!(yearly[1].discount_cents, 100);
        assert_eq!(yearly[1].net_cents, 1900);
    }

    #[tokio::test]
    async fn test_best_sellers_unsold_and_summary() {
        let db = testing::memory_db().await;
        let widget = testing::product(&db, "Widget", 1000, 10).await;
        let gadget = testing::product(&db, "gadget", 500, 10).await;
        let dusty = testing::product(&db, "Dusty", 200, 3).await;
        db.checkout()
            .checkout(&testing::cash(&[(&widget, 3), (&gadget, 1)], 0))
            .await
            .unwrap();

        let best = db.analytics().best_sellers(10).await.unwrap();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].product_id, widget.id);
        assert_eq!(best[0].profit_cents, 1200);

        let unsold = db.analytics().unsold_products().await.unwrap();
        assert_eq!(unsold.len(), 1);
        assert_eq!(unsold[0].product_id, dusty.id);
        assert_eq!(unsold[0].category_name, "General");

        let summary = db.analytics().product_summary().await.unwrap();
        let names: Vec<&str> = summary.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Dusty", "gadget", "Widget"]);
        let widget_row = &summary[2];
        assert_eq!(widget_row.units_sold, 3);
        assert_eq!(widget_row.current_stock, 7);
        assert_eq!(widget_row.revenue_cents, 3000);
        assert_eq!(widget_row.gross_profit_cents, 1200);
    }
}
