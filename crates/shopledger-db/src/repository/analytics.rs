//! # Analytics Aggregation Engine
//!
//! Read-only aggregation over persisted sales, line items and expenses.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  sales ─┬─► windowed scalar sums  ──► SummaryReport                 │
//! │         │                                                           │
//! │  line   ├─► windowed row fetch ──► in-memory grouping ──► ranked    │
//! │  items  │        (product / location / customer)         entries    │
//! │         │                                                           │
//! │  expenses ─► windowed sum ─────────┘                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Aggregation never fails on missing data: an empty window produces a
//! zero-valued summary and empty rankings, not an error. Only store
//! failures propagate.
//!
//! ## Conventions
//! - Report windows are calendar-aligned ([`ReportPeriod`]); the
//!   trailing-days policy lives in the recent-sales feed, not here.
//! - Revenue figures are VAT-exclusive (`gross_cents`) except in the
//!   location/customer performance entries, which rank by what the sale
//!   point actually took in (`total_cents`).
//! - COGS always derives from the `unit_cost_cents` snapshotted on the
//!   line item, never from the product's current cost. A null snapshot
//!   counts as zero cost - a documented approximation, not an error.
//! - `low_stock_count` reads current inventory and ignores the window.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::DbResult;
use shopledger_core::{Customer, Money, RateBps, ReportPeriod, Window};

/// Bucket key for sales carrying neither a usable branch label, location,
/// nor customer.
pub const UNASSIGNED_KEY: &str = "unassigned";

/// Default entry count for the top-products ranking.
pub const DEFAULT_TOP_PRODUCTS_LIMIT: usize = 5;

/// Default entry count for the performance rankings.
pub const DEFAULT_PERFORMANCE_LIMIT: usize = 10;

// =============================================================================
// Report Records
// =============================================================================

/// The financial summary for a reporting window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub window: Window,
    /// Number of sales in the window.
    pub total_sales: i64,
    /// Σ gross_cents - VAT-exclusive revenue.
    pub total_revenue_cents: i64,
    /// Σ quantity × snapshotted unit cost (null cost counts as zero).
    pub cogs_cents: i64,
    /// Revenue minus COGS.
    pub gross_profit_cents: i64,
    /// Σ tax_cents.
    pub tax_total_cents: i64,
    /// Σ expense amounts in the window.
    pub expenses_total_cents: i64,
    /// Gross profit minus expenses.
    pub profit_before_tax_cents: i64,
    /// Rate used for the estimate, from configuration.
    pub income_tax_rate_bps: u32,
    /// max(0, profit before tax) × income tax rate.
    pub estimated_income_tax_cents: i64,
    pub profit_after_tax_cents: i64,
    /// Products currently below their low-stock threshold, org-wide,
    /// independent of the window.
    pub low_stock_count: i64,
}

/// One row of the top-products ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub quantity_sold: i64,
    /// Σ unit_price × quantity over the ranked lines (VAT-exclusive).
    pub revenue_cents: i64,
}

/// One row of the location performance ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPerformanceEntry {
    /// Grouping key: trimmed branch label, else location id, else
    /// "unassigned".
    pub key: String,
    /// Human-readable name: the branch label itself, or the location's name
    /// resolved by lookup (falling back to the raw id).
    pub name: String,
    pub sales_count: i64,
    /// Σ total_cents - what the sale point took in, VAT included.
    pub revenue_cents: i64,
    pub cogs_cents: i64,
    pub gross_profit_cents: i64,
}

/// One row of the customer performance ranking. Geographic attributes come
/// along for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPerformanceEntry {
    /// Customer id, or "unassigned".
    pub key: String,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub country: Option<String>,
    pub sales_count: i64,
    pub revenue_cents: i64,
    pub cogs_cents: i64,
    pub gross_profit_cents: i64,
}

/// Filters for the top-products ranking.
#[derive(Debug, Clone, Default)]
pub struct TopProductsQuery {
    /// `None` ranks over all history.
    pub window: Option<Window>,
    pub location_id: Option<String>,
    pub customer_id: Option<String>,
    /// `None` applies [`DEFAULT_TOP_PRODUCTS_LIMIT`].
    pub limit: Option<usize>,
}

// =============================================================================
// Row shapes (internal)
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    product_id: String,
    name: String,
    sku: String,
    quantity: i64,
    unit_price_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleGroupRow {
    id: String,
    location_id: Option<String>,
    branch_name: Option<String>,
    customer_id: Option<String>,
    total_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct CogsRow {
    sale_id: String,
    quantity: i64,
    unit_cost_cents: Option<i64>,
}

#[derive(Debug, Default, Clone)]
struct Bucket {
    sales_count: i64,
    revenue_cents: i64,
    cogs_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// The analytics aggregation engine.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    pool: SqlitePool,
    config: EngineConfig,
}

impl AnalyticsRepository {
    pub fn new(pool: SqlitePool, config: EngineConfig) -> Self {
        AnalyticsRepository { pool, config }
    }

    /// Computes the financial summary for a period, anchored at now.
    pub async fn summary(&self, org_id: &str, period: &ReportPeriod) -> DbResult<SummaryReport> {
        let window = period.window_at(Utc::now());
        debug!(org_id = %org_id, from = %window.from, to = %window.to, "Computing summary");

        let (total_sales, total_revenue_cents, tax_total_cents) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(gross_cents), 0),
                       COALESCE(SUM(tax_cents), 0)
                FROM sales
                WHERE org_id = ?1 AND created_at >= ?2 AND created_at < ?3
                "#,
            )
            .bind(org_id)
            .bind(window.from)
            .bind(window.to)
            .fetch_one(&self.pool)
            .await?;

        let cogs_cents = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(li.quantity * COALESCE(li.unit_cost_cents, 0)), 0)
            FROM sale_line_items li
            JOIN sales s ON s.id = li.sale_id
            WHERE s.org_id = ?1 AND s.created_at >= ?2 AND s.created_at < ?3
            "#,
        )
        .bind(org_id)
        .bind(window.from)
        .bind(window.to)
        .fetch_one(&self.pool)
        .await?;

        let expenses_total_cents = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM expenses
            WHERE org_id = ?1 AND occurred_on >= ?2 AND occurred_on < ?3
            "#,
        )
        .bind(org_id)
        .bind(window.from)
        .bind(window.to)
        .fetch_one(&self.pool)
        .await?;

        let low_stock_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE org_id = ?1 AND stock < min_stock",
        )
        .bind(org_id)
        .fetch_one(&self.pool)
        .await?;

        let gross_profit = Money::from_cents(total_revenue_cents) - Money::from_cents(cogs_cents);
        let profit_before_tax = gross_profit - Money::from_cents(expenses_total_cents);
        let income_tax_rate = RateBps::from_bps(self.config.income_tax_bps);
        // A loss owes no estimated income tax.
        let estimated_income_tax = profit_before_tax.max_zero().apply_rate(income_tax_rate);
        let profit_after_tax = profit_before_tax - estimated_income_tax;

        Ok(SummaryReport {
            window,
            total_sales,
            total_revenue_cents,
            cogs_cents,
            gross_profit_cents: gross_profit.cents(),
            tax_total_cents,
            expenses_total_cents,
            profit_before_tax_cents: profit_before_tax.cents(),
            income_tax_rate_bps: income_tax_rate.bps(),
            estimated_income_tax_cents: estimated_income_tax.cents(),
            profit_after_tax_cents: profit_after_tax.cents(),
            low_stock_count,
        })
    }

    /// Ranks products by quantity sold (revenue as tie-break), descending.
    pub async fn top_products(
        &self,
        org_id: &str,
        query: &TopProductsQuery,
    ) -> DbResult<Vec<TopProductEntry>> {
        let mut sql = String::from(
            r#"
            SELECT li.product_id, p.name, p.sku, li.quantity, li.unit_price_cents
            FROM sale_line_items li
            JOIN sales s ON s.id = li.sale_id
            JOIN products p ON p.id = li.product_id
            WHERE s.org_id = ?
            "#,
        );
        if query.window.is_some() {
            sql.push_str(" AND s.created_at >= ? AND s.created_at < ?");
        }
        if query.location_id.is_some() {
            sql.push_str(" AND s.location_id = ?");
        }
        if query.customer_id.is_some() {
            sql.push_str(" AND s.customer_id = ?");
        }

        let mut q = sqlx::query_as::<_, LineRow>(&sql).bind(org_id);
        if let Some(window) = query.window {
            q = q.bind(window.from).bind(window.to);
        }
        if let Some(ref location_id) = query.location_id {
            q = q.bind(location_id);
        }
        if let Some(ref customer_id) = query.customer_id {
            q = q.bind(customer_id);
        }
        let rows = q.fetch_all(&self.pool).await?;

        // Group by product; a BTreeMap keeps ties deterministic.
        let mut grouped: BTreeMap<String, TopProductEntry> = BTreeMap::new();
        for row in rows {
            let entry = grouped
                .entry(row.product_id.clone())
                .or_insert_with(|| TopProductEntry {
                    product_id: row.product_id.clone(),
                    name: row.name.clone(),
                    sku: row.sku.clone(),
                    quantity_sold: 0,
                    revenue_cents: 0,
                });
            entry.quantity_sold += row.quantity;
            entry.revenue_cents += row.unit_price_cents * row.quantity;
        }

        let mut entries: Vec<TopProductEntry> = grouped.into_values().collect();
        entries.sort_by(|a, b| {
            b.quantity_sold
                .cmp(&a.quantity_sold)
                .then(b.revenue_cents.cmp(&a.revenue_cents))
        });
        entries.truncate(query.limit.unwrap_or(DEFAULT_TOP_PRODUCTS_LIMIT));
        Ok(entries)
    }

    /// Ranks sale points by gross profit (revenue as tie-break), descending.
    ///
    /// Grouping key preference per sale: trimmed non-empty `branch_name`,
    /// else `location_id`, else the "unassigned" bucket. Location-id keys
    /// are resolved to location names for display.
    pub async fn location_performance(
        &self,
        org_id: &str,
        window: Option<Window>,
        limit: Option<usize>,
    ) -> DbResult<Vec<LocationPerformanceEntry>> {
        let sales = self.fetch_sales(org_id, window).await?;
        let cogs_by_sale = self.fetch_cogs_by_sale(org_id, window).await?;

        let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
        for sale in &sales {
            let key = sale
                .branch_name
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .or(sale.location_id.as_deref())
                .unwrap_or(UNASSIGNED_KEY);

            let bucket = buckets.entry(key.to_string()).or_default();
            bucket.sales_count += 1;
            bucket.revenue_cents += sale.total_cents;
            bucket.cogs_cents += cogs_by_sale.get(&sale.id).copied().unwrap_or(0);
        }

        // Resolve legacy location-id buckets to human-readable names.
        let location_names: HashMap<String, String> = sqlx::query_as::<_, (String, String)>(
            "SELECT id, name FROM locations WHERE org_id = ?1",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .collect();

        let mut entries: Vec<LocationPerformanceEntry> = buckets
            .into_iter()
            .map(|(key, bucket)| {
                let name = if key == UNASSIGNED_KEY {
                    "Unassigned".to_string()
                } else {
                    location_names.get(&key).cloned().unwrap_or_else(|| key.clone())
                };
                LocationPerformanceEntry {
                    name,
                    sales_count: bucket.sales_count,
                    revenue_cents: bucket.revenue_cents,
                    cogs_cents: bucket.cogs_cents,
                    gross_profit_cents: bucket.revenue_cents - bucket.cogs_cents,
                    key,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.gross_profit_cents
                .cmp(&a.gross_profit_cents)
                .then(b.revenue_cents.cmp(&a.revenue_cents))
        });
        entries.truncate(limit.unwrap_or(DEFAULT_PERFORMANCE_LIMIT));
        Ok(entries)
    }

    /// Ranks customers by gross profit (revenue as tie-break), descending,
    /// carrying their geographic attributes for display. Sales without a
    /// customer land in the "unassigned" bucket.
    pub async fn customer_performance(
        &self,
        org_id: &str,
        window: Option<Window>,
        limit: Option<usize>,
    ) -> DbResult<Vec<CustomerPerformanceEntry>> {
        let sales = self.fetch_sales(org_id, window).await?;
        let cogs_by_sale = self.fetch_cogs_by_sale(org_id, window).await?;

        let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
        for sale in &sales {
            let key = sale.customer_id.as_deref().unwrap_or(UNASSIGNED_KEY);
            let bucket = buckets.entry(key.to_string()).or_default();
            bucket.sales_count += 1;
            bucket.revenue_cents += sale.total_cents;
            bucket.cogs_cents += cogs_by_sale.get(&sale.id).copied().unwrap_or(0);
        }

        let customers: HashMap<String, Customer> = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, org_id, name, email, phone, city, state, lga, country, created_at
            FROM customers
            WHERE org_id = ?1
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();

        let mut entries: Vec<CustomerPerformanceEntry> = buckets
            .into_iter()
            .map(|(key, bucket)| {
                let customer = customers.get(&key);
                CustomerPerformanceEntry {
                    name: match customer {
                        Some(c) => c.name.clone(),
                        None if key == UNASSIGNED_KEY => "Unassigned".to_string(),
                        None => key.clone(),
                    },
                    city: customer.and_then(|c| c.city.clone()),
                    state: customer.and_then(|c| c.state.clone()),
                    lga: customer.and_then(|c| c.lga.clone()),
                    country: customer.and_then(|c| c.country.clone()),
                    sales_count: bucket.sales_count,
                    revenue_cents: bucket.revenue_cents,
                    cogs_cents: bucket.cogs_cents,
                    gross_profit_cents: bucket.revenue_cents - bucket.cogs_cents,
                    key,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.gross_profit_cents
                .cmp(&a.gross_profit_cents)
                .then(b.revenue_cents.cmp(&a.revenue_cents))
        });
        entries.truncate(limit.unwrap_or(DEFAULT_PERFORMANCE_LIMIT));
        Ok(entries)
    }

    /// Fetches the sales rows a grouping pass works over.
    async fn fetch_sales(&self, org_id: &str, window: Option<Window>) -> DbResult<Vec<SaleGroupRow>> {
        let mut sql = String::from(
            r#"
            SELECT id, location_id, branch_name, customer_id, total_cents
            FROM sales
            WHERE org_id = ?
            "#,
        );
        if window.is_some() {
            sql.push_str(" AND created_at >= ? AND created_at < ?");
        }

        let mut q = sqlx::query_as::<_, SaleGroupRow>(&sql).bind(org_id);
        if let Some(window) = window {
            q = q.bind(window.from).bind(window.to);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    /// Builds the sale_id → COGS map for the window from snapshotted line
    /// costs.
    async fn fetch_cogs_by_sale(
        &self,
        org_id: &str,
        window: Option<Window>,
    ) -> DbResult<HashMap<String, i64>> {
        let mut sql = String::from(
            r#"
            SELECT li.sale_id, li.quantity, li.unit_cost_cents
            FROM sale_line_items li
            JOIN sales s ON s.id = li.sale_id
            WHERE s.org_id = ?
            "#,
        );
        if window.is_some() {
            sql.push_str(" AND s.created_at >= ? AND s.created_at < ?");
        }

        let mut q = sqlx::query_as::<_, CogsRow>(&sql).bind(org_id);
        if let Some(window) = window {
            q = q.bind(window.from).bind(window.to);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let mut cogs: HashMap<String, i64> = HashMap::new();
        for row in rows {
            *cogs.entry(row.sale_id).or_insert(0) +=
                row.quantity * row.unit_cost_cents.unwrap_or(0);
        }
        Ok(cogs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::NewCustomer;
    use crate::repository::expense::NewExpense;
    use crate::repository::location::NewLocation;
    use crate::repository::organization::NewOrganization;
    use crate::repository::product::NewProduct;
    use crate::repository::sale::OrgContext;
    use shopledger_core::{SaleDraft, SaleLineInput};

    struct Fixture {
        db: Database,
        ctx: OrgContext,
        location_id: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let org = db
            .organizations()
            .create(&NewOrganization {
                name: "Amaka Stores".to_string(),
                jurisdiction: None,
            })
            .await
            .unwrap();
        let location = db
            .locations()
            .create(&NewLocation {
                org_id: org.id.clone(),
                name: "Ikeja Branch".to_string(),
                address: None,
                city: None,
                state: None,
            })
            .await
            .unwrap();
        Fixture {
            db,
            ctx: OrgContext::new(org.id, "user-1"),
            location_id: location.id,
        }
    }

    async fn product(f: &Fixture, sku: &str, price: i64, cost: Option<i64>, stock: i64) -> String {
        let p = f
            .db
            .products()
            .create(&NewProduct {
                org_id: f.ctx.org_id.clone(),
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                price_cents: price,
                cost_cents: cost,
                min_stock: None,
                tax_exempt: false,
            })
            .await
            .unwrap();
        if stock > 0 {
            f.db.products()
                .receive_stock(&f.ctx.org_id, &p.id, &f.location_id, stock)
                .await
                .unwrap();
        }
        p.id
    }

    async fn sell(
        f: &Fixture,
        product_id: &str,
        quantity: i64,
        unit_price: i64,
        customer_id: Option<&str>,
        branch_name: Option<&str>,
    ) {
        f.db.sales()
            .create_sale(
                &f.ctx,
                &SaleDraft {
                    location_id: Some(f.location_id.clone()),
                    customer_id: customer_id.map(str::to_string),
                    branch_name: branch_name.map(str::to_string),
                    lines: vec![SaleLineInput {
                        product_id: product_id.to_string(),
                        quantity,
                        unit_price_cents: unit_price,
                        unit_cost_cents: None,
                    }],
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_window_is_all_zero_but_low_stock_counts() {
        let f = fixture().await;
        // 3 in stock, threshold 5: low stock regardless of the sale window.
        product(&f, "LOW-1", 10_000, Some(6_000), 3).await;

        let summary = f
            .db
            .analytics()
            .summary(&f.ctx.org_id, &ReportPeriod::Daily)
            .await
            .unwrap();

        assert_eq!(summary.total_sales, 0);
        assert_eq!(summary.total_revenue_cents, 0);
        assert_eq!(summary.cogs_cents, 0);
        assert_eq!(summary.gross_profit_cents, 0);
        assert_eq!(summary.tax_total_cents, 0);
        assert_eq!(summary.expenses_total_cents, 0);
        assert_eq!(summary.profit_before_tax_cents, 0);
        assert_eq!(summary.estimated_income_tax_cents, 0);
        assert_eq!(summary.profit_after_tax_cents, 0);
        assert_eq!(summary.low_stock_count, 1);
    }

    #[tokio::test]
    async fn test_summary_profit_chain() {
        let f = fixture().await;
        f.db.tax_rules().seed_default_vat(&f.ctx.org_id).await.unwrap();
        let p = product(&f, "SKU-A", 10_000, Some(6_000), 10).await;

        // 5 units at 100.00: revenue 500.00, COGS 300.00, VAT 37.50.
        sell(&f, &p, 5, 10_000, None, None).await;
        f.db.expenses()
            .record(&NewExpense {
                org_id: f.ctx.org_id.clone(),
                amount_cents: 10_000,
                category: "rent".to_string(),
                occurred_on: Utc::now(),
            })
            .await
            .unwrap();

        let summary = f
            .db
            .analytics()
            .summary(&f.ctx.org_id, &ReportPeriod::Monthly)
            .await
            .unwrap();

        assert_eq!(summary.total_sales, 1);
        assert_eq!(summary.total_revenue_cents, 50_000); // VAT-exclusive
        assert_eq!(summary.tax_total_cents, 3_750);
        assert_eq!(summary.cogs_cents, 30_000);
        assert_eq!(summary.gross_profit_cents, 20_000);
        assert_eq!(summary.expenses_total_cents, 10_000);
        assert_eq!(summary.profit_before_tax_cents, 10_000);
        // 30% of 100.00
        assert_eq!(summary.estimated_income_tax_cents, 3_000);
        assert_eq!(summary.profit_after_tax_cents, 7_000);
    }

    #[tokio::test]
    async fn test_loss_period_owes_no_income_tax() {
        let f = fixture().await;
        let p = product(&f, "SKU-A", 10_000, Some(6_000), 10).await;
        sell(&f, &p, 1, 10_000, None, None).await;

        // Expenses dwarf the 40.00 gross profit.
        f.db.expenses()
            .record(&NewExpense {
                org_id: f.ctx.org_id.clone(),
                amount_cents: 100_000,
                category: "rent".to_string(),
                occurred_on: Utc::now(),
            })
            .await
            .unwrap();

        let summary = f
            .db
            .analytics()
            .summary(&f.ctx.org_id, &ReportPeriod::Monthly)
            .await
            .unwrap();

        assert_eq!(summary.profit_before_tax_cents, -96_000);
        assert_eq!(summary.estimated_income_tax_cents, 0);
        assert_eq!(summary.profit_after_tax_cents, -96_000);
    }

    #[tokio::test]
    async fn test_top_products_ranks_quantity_then_revenue() {
        let f = fixture().await;
        let a = product(&f, "SKU-A", 50, Some(10), 20).await;
        let b = product(&f, "SKU-B", 80, Some(10), 20).await;

        // Equal quantities; B's revenue (800) beats A's (500).
        sell(&f, &a, 10, 50, None, None).await;
        sell(&f, &b, 10, 80, None, None).await;

        let top = f
            .db
            .analytics()
            .top_products(&f.ctx.org_id, &TopProductsQuery::default())
            .await
            .unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_id, b);
        assert_eq!(top[0].quantity_sold, 10);
        assert_eq!(top[0].revenue_cents, 800);
        assert_eq!(top[1].product_id, a);

        // Truncation respects the requested limit.
        let top_one = f
            .db
            .analytics()
            .top_products(
                &f.ctx.org_id,
                &TopProductsQuery {
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].product_id, b);
    }

    #[tokio::test]
    async fn test_location_performance_prefers_branch_label() {
        let f = fixture().await;
        let p = product(&f, "SKU-A", 10_000, Some(6_000), 20).await;

        // One sale bucketed under the free-text label, one under the
        // location id (resolved to its name).
        sell(&f, &p, 2, 10_000, None, Some("Pop-up Stand")).await;
        sell(&f, &p, 1, 10_000, None, None).await;

        let entries = f
            .db
            .analytics()
            .location_performance(&f.ctx.org_id, None, None)
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        // 2 units: revenue 20000, cogs 12000, profit 8000 - ranks first.
        assert_eq!(entries[0].key, "Pop-up Stand");
        assert_eq!(entries[0].name, "Pop-up Stand");
        assert_eq!(entries[0].gross_profit_cents, 8_000);

        assert_eq!(entries[1].key, f.location_id);
        assert_eq!(entries[1].name, "Ikeja Branch");
        assert_eq!(entries[1].sales_count, 1);
        assert_eq!(entries[1].gross_profit_cents, 4_000);
    }

    #[tokio::test]
    async fn test_location_performance_buckets_legacy_rows_as_unassigned() {
        let f = fixture().await;
        let p = product(&f, "SKU-A", 10_000, Some(6_000), 20).await;
        sell(&f, &p, 1, 10_000, None, None).await;

        // Legacy row with neither location nor branch label, inserted
        // directly (the engine itself refuses location-less sales).
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, org_id, user_id, customer_id, location_id, branch_name,
                gross_cents, taxable_cents, vat_rate_bps, tax_cents, total_cents,
                created_at
            ) VALUES (?1, ?2, 'user-1', NULL, NULL, NULL, 5000, 5000, 0, 0, 5000, ?3)
            "#,
        )
        .bind("legacy-sale-1")
        .bind(&f.ctx.org_id)
        .bind(Utc::now())
        .execute(f.db.pool())
        .await
        .unwrap();

        let entries = f
            .db
            .analytics()
            .location_performance(&f.ctx.org_id, None, None)
            .await
            .unwrap();

        let unassigned = entries.iter().find(|e| e.key == UNASSIGNED_KEY).unwrap();
        assert_eq!(unassigned.name, "Unassigned");
        assert_eq!(unassigned.sales_count, 1);
        assert_eq!(unassigned.revenue_cents, 5_000);
    }

    #[tokio::test]
    async fn test_customer_performance_carries_geography() {
        let f = fixture().await;
        let customer = f
            .db
            .customers()
            .create(&NewCustomer {
                org_id: f.ctx.org_id.clone(),
                name: "Ngozi Bello".to_string(),
                city: Some("Ikeja".to_string()),
                state: Some("Lagos".to_string()),
                lga: Some("Ikeja".to_string()),
                country: Some("Nigeria".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let p = product(&f, "SKU-A", 10_000, Some(6_000), 20).await;
        sell(&f, &p, 3, 10_000, Some(&customer.id), None).await;
        sell(&f, &p, 1, 10_000, None, None).await;

        let entries = f
            .db
            .analytics()
            .customer_performance(&f.ctx.org_id, None, None)
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, customer.id);
        assert_eq!(entries[0].name, "Ngozi Bello");
        assert_eq!(entries[0].city.as_deref(), Some("Ikeja"));
        assert_eq!(entries[0].lga.as_deref(), Some("Ikeja"));
        assert_eq!(entries[0].sales_count, 1);

        assert_eq!(entries[1].key, UNASSIGNED_KEY);
        assert_eq!(entries[1].name, "Unassigned");
        assert!(entries[1].city.is_none());
    }

    #[tokio::test]
    async fn test_windowed_reports_exclude_out_of_range_sales() {
        let f = fixture().await;
        let p = product(&f, "SKU-A", 10_000, Some(6_000), 20).await;
        sell(&f, &p, 1, 10_000, None, None).await;

        // A window entirely in the past sees nothing.
        let past = Window {
            from: Utc::now() - chrono::Duration::days(30),
            to: Utc::now() - chrono::Duration::days(20),
        };
        let entries = f
            .db
            .analytics()
            .location_performance(&f.ctx.org_id, Some(past), None)
            .await
            .unwrap();
        assert!(entries.is_empty());

        let top = f
            .db
            .analytics()
            .top_products(
                &f.ctx.org_id,
                &TopProductsQuery {
                    window: Some(past),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(top.is_empty());
    }
}
