//! # Sale Input Structs
//!
//! Explicit, validated input shapes for sale creation. Requests arriving
//! from the boundary (API layer, desktop shell) are deserialized into these
//! structs and checked for presence/type/range here - before any business
//! logic or store access runs.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Deserialization (serde)    - field presence and types     │
//! │  Layer 2: THIS MODULE                - ranges, cart shape, location │
//! │  Layer 3: Transaction engine         - stock existence/sufficiency  │
//! │  Layer 4: Database constraints       - FK, CHECK (quantity >= 0)    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check in layer 2 fails fast with an error naming the offending
//! line, and no check has side effects.

use serde::{Deserialize, Serialize};

use crate::error::SaleValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_SALE_LINES};

// =============================================================================
// Inputs
// =============================================================================

/// One requested cart line.
///
/// `unit_price_cents` comes from the caller rather than the catalog so that
/// negotiated prices are possible; the committed line snapshots whatever was
/// charged. `unit_cost_cents` overrides the product cost basis when given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineInput {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub unit_cost_cents: Option<i64>,
}

/// A requested sale: the cart plus its context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    /// Mandatory by business rule; `Option` so the boundary can report the
    /// absence as a typed rejection instead of a deserialization failure.
    pub location_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Optional free-text sale point label kept for legacy callers.
    #[serde(default)]
    pub branch_name: Option<String>,
    pub lines: Vec<SaleLineInput>,
}

impl SaleDraft {
    /// Runs the pre-mutation validation pass.
    ///
    /// Checks, in order: cart non-empty and within the line limit, location
    /// present and non-blank, every line's quantity in (0, MAX], unit price
    /// non-negative, unit cost (when given) non-negative.
    ///
    /// Returns the trimmed location id on success. No side effects on
    /// failure.
    pub fn validate(&self) -> Result<&str, SaleValidationError> {
        if self.lines.is_empty() {
            return Err(SaleValidationError::EmptyCart);
        }
        if self.lines.len() > MAX_SALE_LINES {
            return Err(SaleValidationError::TooManyLines {
                max: MAX_SALE_LINES,
            });
        }

        let location_id = self
            .location_id
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or(SaleValidationError::MissingLocation)?;

        for (idx, line) in self.lines.iter().enumerate() {
            if line.quantity <= 0 || line.quantity > MAX_LINE_QUANTITY {
                return Err(SaleValidationError::InvalidQuantity {
                    line: idx,
                    quantity: line.quantity,
                });
            }
            if line.unit_price_cents < 0 {
                return Err(SaleValidationError::InvalidUnitPrice {
                    line: idx,
                    unit_price_cents: line.unit_price_cents,
                });
            }
            if let Some(cost) = line.unit_cost_cents {
                if cost < 0 {
                    return Err(SaleValidationError::InvalidUnitCost {
                        line: idx,
                        unit_cost_cents: cost,
                    });
                }
            }
        }

        Ok(location_id)
    }

    /// Returns the trimmed branch label, when one was given and non-blank.
    pub fn branch_label(&self) -> Option<&str> {
        self.branch_name
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
