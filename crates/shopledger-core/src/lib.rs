//! # shopledger-core: Pure Business Logic for ShopLedger
//!
//! This crate is the heart of the ShopLedger platform. It contains the
//! tax and reporting arithmetic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     ShopLedger Architecture                         │
//! │                                                                     │
//! │  Hosting process (API server, report renderer, seed tool)          │
//! │       │                                                             │
//! │  ┌────▼────────────────────────────────────────────────────────┐   │
//! │  │             ★ shopledger-core (THIS CRATE) ★                │   │
//! │  │                                                             │   │
//! │  │   ┌────────┐ ┌───────┐ ┌───────┐ ┌────────┐ ┌───────────┐  │   │
//! │  │   │ types  │ │ money │ │  vat  │ │ period │ │ cart      │  │   │
//! │  │   │ Sale   │ │ Money │ │ VAT   │ │ Window │ │ SaleDraft │  │   │
//! │  │   │ Product│ │ Rate  │ │ calc  │ │ math   │ │ checks    │  │   │
//! │  │   └────────┘ └───────┘ └───────┘ └────────┘ └───────────┘  │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS        │   │
//! │  └────┬────────────────────────────────────────────────────────┘   │
//! │       │                                                             │
//! │  ┌────▼────────────────────────────────────────────────────────┐   │
//! │  │              shopledger-db (Storage + Engines)              │   │
//! │  │      SQLite queries, migrations, sale/analytics engines     │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Sale, TaxRule, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`vat`] - VAT computation for a cart of line items
//! - [`cart`] - Validated sale-input structs
//! - [`period`] - Reporting-window computation
//! - [`validation`] - Boundary validators
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic - same input, same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are minor units (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod period;
pub mod types;
pub mod validation;
pub mod vat;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{SaleDraft, SaleLineInput};
pub use error::{SaleValidationError, ValidationError};
pub use money::Money;
pub use period::{ReportPeriod, Window};
pub use types::*;
pub use vat::{compute_vat, VatBreakdown, VatLine};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Jurisdiction code used when seeding a default VAT rule.
pub const DEFAULT_JURISDICTION: &str = "NG";

/// Tax type handled by the sale transaction engine.
pub const VAT_TAX_TYPE: &str = "VAT";

/// Default VAT rate in basis points (750 bps = 7.5%), used only by the
/// idempotent default-rule seeder.
pub const DEFAULT_VAT_RATE_BPS: u32 = 750;

/// Default estimated income tax rate in basis points (3000 bps = 30%).
/// Overridable through engine configuration.
pub const DEFAULT_INCOME_TAX_RATE_BPS: u32 = 3000;

/// Default low-stock threshold for products created without one.
pub const DEFAULT_MIN_STOCK: i64 = 5;

/// Maximum quantity of a single line in a sale.
///
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum number of lines in a single sale.
pub const MAX_SALE_LINES: usize = 100;
