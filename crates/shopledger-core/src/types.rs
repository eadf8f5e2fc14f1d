//! # Domain Types
//!
//! Core domain entities shared by the sale transaction engine and the
//! analytics aggregation engine.
//!
//! ## Ownership Model
//! Every entity is scoped to exactly one organization. Cross-organization
//! reads and writes are forbidden; the storage layer enforces this by always
//! filtering on the caller's resolved organization id.
//!
//! ## Snapshot Pattern
//! `Sale` and `SaleLineItem` freeze amounts, prices and cost bases at commit
//! time. Later edits to products or tax rules never retroactively alter
//! historical sales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Rate (basis points)
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// 1 basis point = 0.01% = 1/10000. 750 bps = 7.5% (Nigerian VAT);
/// 3000 bps = 30% (default estimated income tax).
///
/// Rates are integers so monetary arithmetic never touches binary floating
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBps(u32);

impl RateBps {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        RateBps(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a fraction (for display only, never arithmetic).
    #[inline]
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        RateBps(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for RateBps {
    fn default() -> Self {
        RateBps::zero()
    }
}

// =============================================================================
// Organization
// =============================================================================

/// A tenant. Membership and invitation workflows are handled by the hosting
/// platform; the engines only need the id and the tax jurisdiction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// Jurisdiction code driving tax-rule resolution (e.g. "NG").
    pub jurisdiction: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Location
// =============================================================================

/// A physical or logical sales point (branch). Stock is tracked per product
/// per location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Location {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record. Geographic attributes feed the customer performance
/// report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Local government area (Nigerian administrative subdivision).
    pub lga: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Tax Rule
// =============================================================================

/// A time-bounded tax rule for an (organization, jurisdiction, type) triple.
///
/// A rule is active at instant `t` when `effective_from <= t` and
/// (`effective_to` is null or `t < effective_to`). At most one rule per
/// triple should be active at any instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TaxRule {
    pub id: String,
    pub org_id: String,
    pub jurisdiction: String,
    /// Tax type, e.g. "VAT".
    pub tax_type: String,
    /// Rate in basis points (750 = 7.5%).
    pub rate_bps: u32,
    pub effective_from: DateTime<Utc>,
    /// Open-ended when `None`.
    pub effective_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaxRule {
    /// Returns the rate as a typed value.
    #[inline]
    pub fn rate(&self) -> RateBps {
        RateBps::from_bps(self.rate_bps)
    }

    /// Checks whether the rule is active at the given instant.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.effective_from <= at && self.effective_to.map_or(true, |to| at < to)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub org_id: String,
    /// Stock Keeping Unit - business identifier, unique per organization.
    pub sku: String,
    pub name: String,
    /// Selling price in minor units.
    pub price_cents: i64,
    /// Cost basis in minor units; `None` when unknown.
    pub cost_cents: Option<i64>,
    /// Denormalized total stock across locations. The per-location ledger
    /// (`ProductStock`) is authoritative; this mirror is updated in the same
    /// transaction as every ledger mutation.
    pub stock: i64,
    /// Low-stock threshold; the product counts as low stock when
    /// `stock < min_stock`.
    pub min_stock: i64,
    /// Tax-exempt products contribute to gross but not taxable amounts.
    pub tax_exempt: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the cost basis as Money, when known.
    #[inline]
    pub fn cost(&self) -> Option<Money> {
        self.cost_cents.map(Money::from_cents)
    }

    /// Checks whether the product is below its low-stock threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.min_stock
    }
}

// =============================================================================
// Product Stock (per-location ledger)
// =============================================================================

/// Per-(product, location) stock quantity - the authoritative ledger for
/// availability checks. Quantity never goes negative; a sale that would
/// violate this is rejected before any mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductStock {
    pub product_id: String,
    pub location_id: String,
    pub org_id: String,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Created once, atomically, with its line items;
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub org_id: String,
    /// Seller (resolved by the session collaborator).
    pub user_id: String,
    pub customer_id: Option<String>,
    pub location_id: Option<String>,
    /// Legacy free-text sale point label; preferred over `location_id` when
    /// grouping location performance.
    pub branch_name: Option<String>,
    /// Pre-VAT value: Σ unit_price × quantity over all lines.
    pub gross_cents: i64,
    /// Portion of gross subject to VAT (excludes tax-exempt lines).
    pub taxable_cents: i64,
    /// VAT rate applied, snapshotted at commit time.
    pub vat_rate_bps: u32,
    /// Computed VAT in minor units.
    pub tax_cents: i64,
    /// Gross plus VAT.
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn gross(&self) -> Money {
        Money::from_cents(self.gross_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Line Item
// =============================================================================

/// A line of a sale. Uses the snapshot pattern: unit price and unit cost are
/// frozen at sale time, independent of later product edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLineItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price at sale time (frozen).
    pub unit_price_cents: i64,
    /// Unit cost at sale time (frozen); `None` when the cost basis was
    /// unknown. COGS treats an unknown cost as zero.
    pub unit_cost_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl SaleLineItem {
    /// Line revenue: unit price × quantity.
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    /// Line cost of goods sold; unknown unit cost counts as zero.
    #[inline]
    pub fn cogs(&self) -> Money {
        Money::from_cents(self.unit_cost_cents.unwrap_or(0)).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// An operating expense; read-only input to profit aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub org_id: String,
    pub amount_cents: i64,
    pub category: String,
    pub occurred_on: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
