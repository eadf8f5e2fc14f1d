//! # Engine Configuration
//!
//! Tunables consumed by the engines, loaded from environment variables with
//! code defaults. The hosting process loads this once and hands it to
//! [`crate::DbConfig`].

use serde::{Deserialize, Serialize};
use shopledger_core::{DEFAULT_INCOME_TAX_RATE_BPS, DEFAULT_MIN_STOCK};
use std::env;

/// Engine configuration.
///
/// | Field              | Env var                      | Default |
/// |--------------------|------------------------------|---------|
/// | `income_tax_bps`   | `SHOPLEDGER_INCOME_TAX_BPS`  | 3000    |
/// | `default_min_stock`| `SHOPLEDGER_MIN_STOCK`       | 5       |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Estimated income tax rate in basis points, applied to positive
    /// profit-before-tax in the analytics summary.
    pub income_tax_bps: u32,

    /// Low-stock threshold assigned to products created without an explicit
    /// one.
    pub default_min_stock: i64,
}

impl EngineConfig {
    /// Loads configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        EngineConfig {
            income_tax_bps: env::var("SHOPLEDGER_INCOME_TAX_BPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_INCOME_TAX_RATE_BPS),

            default_min_stock: env::var("SHOPLEDGER_MIN_STOCK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MIN_STOCK),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            income_tax_bps: DEFAULT_INCOME_TAX_RATE_BPS,
            default_min_stock: DEFAULT_MIN_STOCK,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
