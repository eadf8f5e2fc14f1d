//! # shopledger-db: Storage Layer and Engines for ShopLedger
//!
//! This crate provides database access for the ShopLedger platform, plus the
//! two engines built on top of it:
//!
//! - the **sale transaction engine** ([`repository::sale`]) - validates a
//!   cart against per-location stock, computes VAT, and commits the sale,
//!   its line items, and the stock decrements as one atomic unit;
//! - the **analytics aggregation engine** ([`repository::analytics`]) -
//!   recomputes revenue, COGS, profit, estimated income tax and low-stock
//!   counts over a time window, and ranks products, locations and customers.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`config`] - Engine configuration (income tax rate, low-stock default)
//! - [`error`] - Database error types
//! - [`repository`] - Repositories and engines
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopledger_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shopledger.db")).await?;
//!
//! let sale = db.sales().create_sale(&ctx, &draft).await?;
//! let summary = db.analytics().summary(&ctx.org_id, &ReportPeriod::Monthly).await?;
//! ```
//!
//! The `Database` handle is injected into hosting code explicitly; there is
//! no global client. Lifecycle (connect/close) belongs to the hosting
//! process.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::EngineConfig;
pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::analytics::AnalyticsRepository;
pub use repository::customer::CustomerRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::location::LocationRepository;
pub use repository::organization::OrganizationRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{OrgContext, SaleError, SaleRepository};
pub use repository::tax_rule::{TaxRuleError, TaxRuleRepository};
