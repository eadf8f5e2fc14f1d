//! # Sale Transaction Engine
//!
//! Validates a cart against per-location stock, computes VAT, and commits
//! the sale as one atomic unit.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  1. READ PASS (no transaction, no side effects)                     │
//! │     ├── context present?           → Unauthorized                   │
//! │     ├── cart shape valid?          → EmptyCart / MissingLocation /  │
//! │     │                                InvalidQuantity(line)          │
//! │     ├── product known to org?      → NotStocked                     │
//! │     ├── ledger row at location?    → NotStocked                     │
//! │     └── quantity sufficient?       → InsufficientStock              │
//! │                                                                     │
//! │  2. RESOLVE RATE  (no active rule → rate 0, explicitly, logged)     │
//! │  3. COMPUTE VAT   (pure, shopledger-core)                           │
//! │                                                                     │
//! │  4. TRANSACTION                                                     │
//! │     ├── INSERT sale (snapshotted amounts)                           │
//! │     ├── INSERT line items (snapshotted price/cost)                  │
//! │     ├── per product: UPDATE product_stock                           │
//! │     │       SET quantity = quantity - N                             │
//! │     │       WHERE ... AND quantity >= N   ← the concurrency guard   │
//! │     │   0 rows affected → a concurrent sale won the race:           │
//! │     │   ROLLBACK, InsufficientStock                                 │
//! │     └── per product: UPDATE products SET stock = stock - N          │
//! │  5. COMMIT - or nothing happened at all                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The conditional decrement - not the read pass - is what makes two
//! simultaneous sales safe: SQLite serializes writers, so whichever
//! transaction runs second sees the first one's decrement and fails the
//! `quantity >= N` guard. A plain read-then-write would double-sell. The
//! read pass exists only to fail fast without opening a transaction.
//!
//! No in-process locks: multiple server instances may run against the same
//! store, so the store itself must carry the guarantee.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::tax_rule::TaxRuleRepository;
use shopledger_core::error::SaleValidationError;
use shopledger_core::vat::{compute_vat, VatLine};
use shopledger_core::{Money, RateBps, Sale, SaleDraft, SaleLineItem, Window, VAT_TAX_TYPE};

// =============================================================================
// Context & Errors
// =============================================================================

/// The authorization context resolved by the hosting platform's session
/// collaborator. The engine trusts these ids as already authorized; it only
/// rejects an absent context.
#[derive(Debug, Clone)]
pub struct OrgContext {
    pub org_id: String,
    pub user_id: String,
}

impl OrgContext {
    pub fn new(org_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        OrgContext {
            org_id: org_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// The full failure taxonomy of `create_sale`. Every variant is
/// distinguishable by the caller; validation variants identify the offending
/// line.
#[derive(Debug, thiserror::Error)]
pub enum SaleError {
    /// Missing organization or user context (or an organization unknown to
    /// the store - an unresolvable tenant is indistinguishable from an
    /// unauthorized one).
    #[error("missing organization or user context")]
    Unauthorized,

    /// The cart failed the pre-mutation validation pass.
    #[error(transparent)]
    Invalid(#[from] SaleValidationError),

    /// No stock ledger row exists for (product, location). Unknown products
    /// and other organizations' products report the same way, so callers
    /// can't probe across tenants.
    #[error("product {product_id} is not stocked at location {location_id}")]
    NotStocked {
        product_id: String,
        location_id: String,
    },

    /// The ledger row exists but holds less than the requested quantity
    /// (detected either at the read pass or at commit time after losing a
    /// race).
    #[error("insufficient stock for product {product_id} at location {location_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        location_id: String,
        available: i64,
        requested: i64,
    },

    /// The store failed mid-transaction; everything rolled back, no partial
    /// state is visible.
    #[error(transparent)]
    Store(#[from] DbError),
}

// =============================================================================
// Repository
// =============================================================================

/// The sale transaction engine and the sale read surface.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Creates a sale: all-or-nothing.
    ///
    /// On success the sale row, its line items, the per-location ledger
    /// decrements and the denormalized product totals are all committed
    /// together. On any failure - validation, stock, or store - nothing is
    /// persisted.
    pub async fn create_sale(&self, ctx: &OrgContext, draft: &SaleDraft) -> Result<Sale, SaleError> {
        if ctx.org_id.trim().is_empty() || ctx.user_id.trim().is_empty() {
            return Err(SaleError::Unauthorized);
        }
        let location_id = draft.validate()?;

        debug!(org_id = %ctx.org_id, location_id = %location_id, lines = draft.lines.len(), "create_sale");

        // The jurisdiction lives on the organization row; an organization the
        // store doesn't know cannot be authorized.
        let jurisdiction = sqlx::query_scalar::<_, String>(
            "SELECT jurisdiction FROM organizations WHERE id = ?1",
        )
        .bind(&ctx.org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or(SaleError::Unauthorized)?;

        // A cart may list the same product on several lines; availability is
        // judged on the combined quantity.
        let mut requested: BTreeMap<&str, i64> = BTreeMap::new();
        for line in &draft.lines {
            *requested.entry(line.product_id.as_str()).or_insert(0) += line.quantity;
        }

        // Read pass: fail fast, before the transaction, with no side effects.
        let mut product_flags: BTreeMap<&str, (bool, Option<i64>)> = BTreeMap::new();
        for (&product_id, &quantity) in &requested {
            let product = sqlx::query_as::<_, (bool, Option<i64>)>(
                "SELECT tax_exempt, cost_cents FROM products WHERE id = ?1 AND org_id = ?2",
            )
            .bind(product_id)
            .bind(&ctx.org_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

            let Some(flags) = product else {
                return Err(SaleError::NotStocked {
                    product_id: product_id.to_string(),
                    location_id: location_id.to_string(),
                });
            };
            product_flags.insert(product_id, flags);

            let available = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT quantity FROM product_stock
                WHERE product_id = ?1 AND location_id = ?2 AND org_id = ?3
                "#,
            )
            .bind(product_id)
            .bind(location_id)
            .bind(&ctx.org_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

            match available {
                // No row: "not stocked here" is a different answer than
                // "stocked but short".
                None => {
                    return Err(SaleError::NotStocked {
                        product_id: product_id.to_string(),
                        location_id: location_id.to_string(),
                    })
                }
                Some(available) if available < quantity => {
                    return Err(SaleError::InsufficientStock {
                        product_id: product_id.to_string(),
                        location_id: location_id.to_string(),
                        available,
                        requested: quantity,
                    })
                }
                Some(_) => {}
            }
        }

        let now = Utc::now();

        // Absence of a rule is not an error: the sale proceeds VAT-free,
        // and the zero rate is snapshotted like any other.
        let rate = match TaxRuleRepository::new(self.pool.clone())
            .resolve_active_rate(&ctx.org_id, &jurisdiction, VAT_TAX_TYPE, now)
            .await?
        {
            Some(rate) => rate,
            None => {
                debug!(org_id = %ctx.org_id, jurisdiction = %jurisdiction, "No active VAT rule; applying zero rate");
                RateBps::zero()
            }
        };

        let vat_lines: Vec<VatLine> = draft
            .lines
            .iter()
            .map(|line| VatLine {
                quantity: line.quantity,
                unit_price: Money::from_cents(line.unit_price_cents),
                tax_exempt: product_flags
                    .get(line.product_id.as_str())
                    .map(|(exempt, _)| *exempt)
                    .unwrap_or(false),
            })
            .collect();
        let breakdown = compute_vat(&vat_lines, rate);

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            org_id: ctx.org_id.clone(),
            user_id: ctx.user_id.clone(),
            // Blank customer ids mean "walk-in", same as absent.
            customer_id: draft
                .customer_id
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            location_id: Some(location_id.to_string()),
            branch_name: draft.branch_label().map(str::to_string),
            gross_cents: breakdown.gross.cents(),
            taxable_cents: breakdown.taxable.cents(),
            vat_rate_bps: rate.bps(),
            tax_cents: breakdown.vat.cents(),
            total_cents: breakdown.total().cents(),
            created_at: now,
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, org_id, user_id, customer_id, location_id, branch_name,
                gross_cents, taxable_cents, vat_rate_bps, tax_cents, total_cents,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.org_id)
        .bind(&sale.user_id)
        .bind(&sale.customer_id)
        .bind(&sale.location_id)
        .bind(&sale.branch_name)
        .bind(sale.gross_cents)
        .bind(sale.taxable_cents)
        .bind(sale.vat_rate_bps)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        for line in &draft.lines {
            // Cost snapshot: the line's explicit cost wins, else the
            // product's current cost basis; unknown stays unknown.
            let unit_cost = line.unit_cost_cents.or_else(|| {
                product_flags
                    .get(line.product_id.as_str())
                    .and_then(|(_, cost)| *cost)
            });

            sqlx::query(
                r#"
                INSERT INTO sale_line_items (
                    id, sale_id, product_id, quantity,
                    unit_price_cents, unit_cost_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(unit_cost)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        for (&product_id, &quantity) in &requested {
            // The guard: decrement only if the result stays non-negative.
            let result = sqlx::query(
                r#"
                UPDATE product_stock SET
                    quantity = quantity - ?4,
                    updated_at = ?5
                WHERE product_id = ?1 AND location_id = ?2 AND org_id = ?3
                  AND quantity >= ?4
                "#,
            )
            .bind(product_id)
            .bind(location_id)
            .bind(&ctx.org_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            if result.rows_affected() == 0 {
                // A concurrent sale consumed the stock after our read pass.
                let available = sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COALESCE(
                        (SELECT quantity FROM product_stock
                         WHERE product_id = ?1 AND location_id = ?2 AND org_id = ?3),
                        0
                    )
                    "#,
                )
                .bind(product_id)
                .bind(location_id)
                .bind(&ctx.org_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DbError::from)?;

                warn!(
                    product_id = %product_id,
                    location_id = %location_id,
                    available,
                    requested = quantity,
                    "Stock decrement lost race; rolling back sale"
                );
                return Err(SaleError::InsufficientStock {
                    product_id: product_id.to_string(),
                    location_id: location_id.to_string(),
                    available,
                    requested: quantity,
                });
            }

            // Mirror the decrement onto the denormalized total, in the same
            // transaction.
            let result = sqlx::query(
                r#"
                UPDATE products SET
                    stock = stock - ?3,
                    updated_at = ?4
                WHERE id = ?1 AND org_id = ?2
                "#,
            )
            .bind(product_id)
            .bind(&ctx.org_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            if result.rows_affected() == 0 {
                return Err(SaleError::Store(DbError::Internal(format!(
                    "stock mirror missing for product {product_id}"
                ))));
            }
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale.id,
            total = %breakdown.total(),
            vat = %breakdown.vat,
            lines = draft.lines.len(),
            "Sale committed"
        );
        Ok(sale)
    }

    /// Gets a sale by id, scoped to the organization.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, org_id, user_id, customer_id, location_id, branch_name,
                   gross_cents, taxable_cents, vat_rate_bps, tax_cents, total_cents,
                   created_at
            FROM sales
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale with its line items.
    pub async fn get_with_items(
        &self,
        org_id: &str,
        id: &str,
    ) -> DbResult<Option<(Sale, Vec<SaleLineItem>)>> {
        let Some(sale) = self.get(org_id, id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleLineItem>(
            r#"
            SELECT id, sale_id, product_id, quantity,
                   unit_price_cents, unit_cost_cents, created_at
            FROM sale_line_items
            WHERE sale_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(&sale.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some((sale, items)))
    }

    /// Lists recent sales, newest first.
    ///
    /// "Recent" here is the trailing-days policy (`days × 86400` seconds
    /// back from now) - this feed is NOT calendar-aligned like the
    /// analytics report windows, and intentionally so.
    pub async fn list_recent(&self, org_id: &str, days: i64, limit: u32) -> DbResult<Vec<Sale>> {
        let window = Window::trailing_days(Utc::now(), days);

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, org_id, user_id, customer_id, location_id, branch_name,
                   gross_cents, taxable_cents, vat_rate_bps, tax_cents, total_cents,
                   created_at
            FROM sales
            WHERE org_id = ?1 AND created_at >= ?2
            ORDER BY created_at DESC
            LIMIT ?3
            "#,
        )
        .bind(org_id)
        .bind(window.from)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::location::NewLocation;
    use crate::repository::organization::NewOrganization;
    use crate::repository::product::NewProduct;
    use shopledger_core::SaleLineInput;

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
                city: Some("Lagos".to_string()),
                state: Some("Lagos".to_string()),
            })
            .await
            .unwrap();
        Fixture {
            db,
            ctx: OrgContext::new(org.id, "user-1"),
            location_id: location.id,
        }
    }

    async fn stocked_product(f: &Fixture, sku: &str, tax_exempt: bool, quantity: i64) -> String {
        let product = f
            .db
            .products()
            .create(&NewProduct {
                org_id: f.ctx.org_id.clone(),
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                price_cents: 10_000,
                cost_cents: Some(6_000),
                min_stock: None,
                tax_exempt,
            })
            .await
            .unwrap();
        if quantity > 0 {
            f.db.products()
                .receive_stock(&f.ctx.org_id, &product.id, &f.location_id, quantity)
                .await
                .unwrap();
        }
        product.id
    }

    fn line(product_id: &str, quantity: i64, unit_price_cents: i64) -> SaleLineInput {
        SaleLineInput {
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents,
            unit_cost_cents: None,
        }
    }

    fn draft(f: &Fixture, lines: Vec<SaleLineInput>) -> SaleDraft {
        SaleDraft {
            location_id: Some(f.location_id.clone()),
            customer_id: None,
            branch_name: None,
            lines,
        }
    }

    async fn sale_count(f: &Fixture) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(f.db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_decrements_ledger_and_mirror() {
        let f = fixture().await;
        f.db.tax_rules().seed_default_vat(&f.ctx.org_id).await.unwrap();
        let product_id = stocked_product(&f, "SKU-A", false, 5).await;

        let sale = f
            .db
            .sales()
            .create_sale(&f.ctx, &draft(&f, vec![line(&product_id, 2, 10_000)]))
            .await
            .unwrap();

        assert_eq!(sale.gross_cents, 20_000);
        assert_eq!(sale.taxable_cents, 20_000);
        assert_eq!(sale.vat_rate_bps, 750);
        assert_eq!(sale.tax_cents, 1_500);
        assert_eq!(sale.total_cents, sale.gross_cents + sale.tax_cents);

        let ledger = f
            .db
            .products()
            .stock_at(&f.ctx.org_id, &product_id, &f.location_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ledger.quantity, 3);

        let mirror = f
            .db
            .products()
            .get(&f.ctx.org_id, &product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mirror.stock, 3);
    }

    #[tokio::test]
    async fn test_vat_excludes_exempt_lines() {
        let f = fixture().await;
        f.db.tax_rules().seed_default_vat(&f.ctx.org_id).await.unwrap();
        let taxable = stocked_product(&f, "SKU-T", false, 10).await;
        let exempt = stocked_product(&f, "SKU-E", true, 10).await;

        // Taxable line grossing 1000.00, exempt line grossing 500.00 at 7.5%.
        let sale = f
            .db
            .sales()
            .create_sale(
                &f.ctx,
                &draft(&f, vec![line(&taxable, 1, 100_000), line(&exempt, 1, 50_000)]),
            )
            .await
            .unwrap();

        assert_eq!(sale.gross_cents, 150_000);
        assert_eq!(sale.taxable_cents, 100_000);
        assert_eq!(sale.tax_cents, 7_500);
        assert_eq!(sale.total_cents, 157_500);
    }

    #[tokio::test]
    async fn test_no_tax_rule_degrades_to_zero_rate() {
        let f = fixture().await;
        let product_id = stocked_product(&f, "SKU-A", false, 5).await;

        let sale = f
            .db
            .sales()
            .create_sale(&f.ctx, &draft(&f, vec![line(&product_id, 1, 10_000)]))
            .await
            .unwrap();

        assert_eq!(sale.vat_rate_bps, 0);
        assert_eq!(sale.tax_cents, 0);
        assert_eq!(sale.total_cents, sale.gross_cents);
    }

    #[tokio::test]
    async fn test_missing_location_rejected_before_any_write() {
        let f = fixture().await;
        let product_id = stocked_product(&f, "SKU-A", false, 5).await;

        let mut d = draft(&f, vec![line(&product_id, 1, 10_000)]);
        d.location_id = None;

        let err = f.db.sales().create_sale(&f.ctx, &d).await.unwrap_err();
        assert!(matches!(
            err,
            SaleError::Invalid(SaleValidationError::MissingLocation)
        ));

        assert_eq!(sale_count(&f).await, 0);
        let ledger = f
            .db
            .products()
            .stock_at(&f.ctx.org_id, &product_id, &f.location_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ledger.quantity, 5);
    }

    #[tokio::test]
    async fn test_empty_cart_and_bad_quantity_rejected() {
        let f = fixture().await;
        let product_id = stocked_product(&f, "SKU-A", false, 5).await;

        let err = f
            .db
            .sales()
            .create_sale(&f.ctx, &draft(&f, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SaleError::Invalid(SaleValidationError::EmptyCart)
        ));

        let err = f
            .db
            .sales()
            .create_sale(&f.ctx, &draft(&f, vec![line(&product_id, 0, 10_000)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SaleError::Invalid(SaleValidationError::InvalidQuantity { line: 0, quantity: 0 })
        ));

        assert_eq!(sale_count(&f).await, 0);
    }

    #[tokio::test]
    async fn test_missing_context_is_unauthorized() {
        let f = fixture().await;
        let product_id = stocked_product(&f, "SKU-A", false, 5).await;

        let ctx = OrgContext::new("", "user-1");
        let err = f
            .db
            .sales()
            .create_sale(&ctx, &draft(&f, vec![line(&product_id, 1, 10_000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::Unauthorized));
    }

    #[tokio::test]
    async fn test_not_stocked_distinct_from_insufficient() {
        let f = fixture().await;
        // Known product, but never stocked at the location.
        let unstocked = stocked_product(&f, "SKU-N", false, 0).await;
        let err = f
            .db
            .sales()
            .create_sale(&f.ctx, &draft(&f, vec![line(&unstocked, 1, 10_000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::NotStocked { .. }));

        // Stocked, but short.
        let short = stocked_product(&f, "SKU-S", false, 1).await;
        let err = f
            .db
            .sales()
            .create_sale(&f.ctx, &draft(&f, vec![line(&short, 2, 10_000)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SaleError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            }
        ));

        // Unknown product ids answer the same as unstocked ones.
        let err = f
            .db
            .sales()
            .create_sale(&f.ctx, &draft(&f, vec![line("no-such-product", 1, 10_000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::NotStocked { .. }));

        assert_eq!(sale_count(&f).await, 0);
    }

    #[tokio::test]
    async fn test_cross_org_products_look_unstocked() {
        let f = fixture().await;
        let foreign_org = f
            .db
            .organizations()
            .create(&NewOrganization {
                name: "Rival Stores".to_string(),
                jurisdiction: None,
            })
            .await
            .unwrap();
        let foreign_product = f
            .db
            .products()
            .create(&NewProduct {
                org_id: foreign_org.id.clone(),
                sku: "THEIRS".to_string(),
                name: "Their Product".to_string(),
                price_cents: 10_000,
                cost_cents: None,
                min_stock: None,
                tax_exempt: false,
            })
            .await
            .unwrap();

        let err = f
            .db
            .sales()
            .create_sale(&f.ctx, &draft(&f, vec![line(&foreign_product.id, 1, 10_000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::NotStocked { .. }));
    }

    #[tokio::test]
    async fn test_repeated_product_lines_judged_on_combined_quantity() {
        let f = fixture().await;
        let product_id = stocked_product(&f, "SKU-A", false, 3).await;

        // 2 + 2 across two lines exceeds the 3 available.
        let err = f
            .db
            .sales()
            .create_sale(
                &f.ctx,
                &draft(&f, vec![line(&product_id, 2, 10_000), line(&product_id, 2, 10_000)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SaleError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cost_snapshot_survives_product_edits() {
        let f = fixture().await;
        let product_id = stocked_product(&f, "SKU-A", false, 5).await;

        let sale = f
            .db
            .sales()
            .create_sale(&f.ctx, &draft(&f, vec![line(&product_id, 2, 10_000)]))
            .await
            .unwrap();

        // Later catalog edits must not touch the committed line.
        f.db.products()
            .update_details(&f.ctx.org_id, &product_id, "Renamed", 99_999, Some(1), 5, false)
            .await
            .unwrap();

        let (_, items) = f
            .db
            .sales()
            .get_with_items(&f.ctx.org_id, &sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price_cents, 10_000);
        assert_eq!(items[0].unit_cost_cents, Some(6_000));
    }

    #[tokio::test]
    async fn test_concurrent_sales_never_oversell() {
        let f = fixture().await;
        let product_id = stocked_product(&f, "SKU-A", false, 5).await;

        let sales_a = f.db.sales();
        let sales_b = f.db.sales();
        let d1 = draft(&f, vec![line(&product_id, 3, 10_000)]);
        let d2 = draft(&f, vec![line(&product_id, 3, 10_000)]);

        let (r1, r2) = tokio::join!(
            sales_a.create_sale(&f.ctx, &d1),
            sales_b.create_sale(&f.ctx, &d2)
        );

        // Exactly one succeeds; the loser reports the post-race availability.
        let succeeded = [r1.is_ok(), r2.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(succeeded, 1);
        let loser = if r1.is_ok() { r2 } else { r1 };
        assert!(matches!(
            loser.unwrap_err(),
            SaleError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));

        let ledger = f
            .db
            .products()
            .stock_at(&f.ctx.org_id, &product_id, &f.location_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ledger.quantity, 2);

        let mirror = f
            .db
            .products()
            .get(&f.ctx.org_id, &product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mirror.stock, 2);

        assert_eq!(sale_count(&f).await, 1);
    }

    #[tokio::test]
    async fn test_list_recent_uses_trailing_window() {
        let f = fixture().await;
        let product_id = stocked_product(&f, "SKU-A", false, 10).await;
        f.db.sales()
            .create_sale(&f.ctx, &draft(&f, vec![line(&product_id, 1, 10_000)]))
            .await
            .unwrap();

        let recent = f.db.sales().list_recent(&f.ctx.org_id, 7, 50).await.unwrap();
        assert_eq!(recent.len(), 1);

        let none = f.db.sales().list_recent(&f.ctx.org_id, 0, 50).await.unwrap();
        assert!(none.is_empty());
    }
}
