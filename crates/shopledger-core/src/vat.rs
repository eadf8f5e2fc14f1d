//! # VAT Computation
//!
//! Pure VAT arithmetic for a cart of line items.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  For each line:                                                     │
//! │      line_gross = unit_price × quantity                             │
//! │      gross     += line_gross                                        │
//! │      taxable   += line_gross   (only when the product is NOT        │
//! │                                 tax-exempt)                         │
//! │                                                                     │
//! │  vat = round_half_up(taxable × rate)      ← applied ONCE, to the    │
//! │                                             taxable total           │
//! │  total = gross + vat                                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding once on the total avoids the cumulative drift that per-line
//! rounding produces on large carts.
//!
//! The caller (the sale transaction engine) resolves the product exemption
//! flags and the active rate; this module never does I/O.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::RateBps;

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// One cart line with its resolved tax-exemption flag.
#[derive(Debug, Clone, Copy)]
pub struct VatLine {
    pub quantity: i64,
    pub unit_price: Money,
    pub tax_exempt: bool,
}

/// The monetary breakdown of a sale, snapshotted onto the sale record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatBreakdown {
    /// Pre-VAT value: Σ unit_price × quantity.
    pub gross: Money,
    /// Portion of gross subject to VAT.
    pub taxable: Money,
    /// Rate applied.
    pub rate: RateBps,
    /// VAT on the taxable total, rounded half-up at the minor unit.
    pub vat: Money,
}

impl VatBreakdown {
    /// Amount the customer pays: gross + VAT.
    #[inline]
    pub fn total(&self) -> Money {
        self.gross + self.vat
    }
}

// =============================================================================
// Computation
// =============================================================================

/// Computes the VAT breakdown for a cart at the given rate.
///
/// Tax-exempt lines contribute to `gross` but not to `taxable`. A zero rate
/// (no active rule for the jurisdiction) yields zero VAT while leaving the
/// gross/taxable split intact.
///
/// ## Example
/// ```rust
/// use shopledger_core::money::Money;
/// use shopledger_core::types::RateBps;
/// use shopledger_core::vat::{compute_vat, VatLine};
///
/// let lines = [
///     VatLine { quantity: 1, unit_price: Money::from_cents(100_000), tax_exempt: false },
///     VatLine { quantity: 1, unit_price: Money::from_cents(50_000), tax_exempt: true },
/// ];
/// let b = compute_vat(&lines, RateBps::from_bps(750));
/// assert_eq!(b.gross.cents(), 150_000);
/// assert_eq!(b.taxable.cents(), 100_000);
/// assert_eq!(b.vat.cents(), 7_500);
/// assert_eq!(b.total().cents(), 157_500);
/// ```
pub fn compute_vat(lines: &[VatLine], rate: RateBps) -> VatBreakdown {
    let mut gross = Money::zero();
    let mut taxable = Money::zero();

    for line in lines {
        let line_gross = line.unit_price.multiply_quantity(line.quantity);
        gross += line_gross;
        if !line.tax_exempt {
            taxable += line_gross;
        }
    }

    VatBreakdown {
        gross,
        taxable,
        rate,
        vat: taxable.apply_rate(rate),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64, unit_price_cents: i64, tax_exempt: bool) -> VatLine {
        VatLine {
            quantity,
            unit_price: Money::from_cents(unit_price_cents),
            tax_exempt,
        }
    }

    #[test]
    fn test_mixed_exempt_cart() {
        // One taxable line grossing 1000.00, one exempt line grossing 500.00
        // at 7.5%: taxable 1000.00, VAT 75.00, total 1575.00.
        let lines = [line(1, 100_000, false), line(1, 50_000, true)];
        let b = compute_vat(&lines, RateBps::from_bps(750));

        assert_eq!(b.gross.cents(), 150_000);
        assert_eq!(b.taxable.cents(), 100_000);
        assert_eq!(b.vat.cents(), 7_500);
        assert_eq!(b.total().cents(), 157_500);
    }

    #[test]
    fn test_total_is_gross_plus_vat_exactly() {
        let lines = [line(3, 3_333, false), line(7, 919, false)];
        let b = compute_vat(&lines, RateBps::from_bps(750));
        assert_eq!(b.total(), b.gross + b.vat);
    }

    #[test]
    fn test_rounds_once_on_total_not_per_line() {
        // Two lines of 0.33 each at 7.5%: per-line VAT would round
        // 0.02475 → 0.02 twice (sum 0.04); rounding once on the 0.66 total
        // gives round(0.0495) = 0.05.
        let lines = [line(1, 33, false), line(1, 33, false)];
        let b = compute_vat(&lines, RateBps::from_bps(750));
        assert_eq!(b.taxable.cents(), 66);
        assert_eq!(b.vat.cents(), 5);
    }

    #[test]
    fn test_zero_rate_degrades_to_no_vat() {
        let lines = [line(2, 10_000, false)];
        let b = compute_vat(&lines, RateBps::zero());
        assert_eq!(b.gross.cents(), 20_000);
        assert_eq!(b.taxable.cents(), 20_000);
        assert_eq!(b.vat.cents(), 0);
        assert_eq!(b.total().cents(), 20_000);
    }

    #[test]
    fn test_all_exempt_cart_has_zero_taxable() {
        let lines = [line(4, 2_500, true)];
        let b = compute_vat(&lines, RateBps::from_bps(750));
        assert_eq!(b.gross.cents(), 10_000);
        assert_eq!(b.taxable.cents(), 0);
        assert_eq!(b.vat.cents(), 0);
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let b = compute_vat(&[], RateBps::from_bps(750));
        assert_eq!(b.gross, Money::zero());
        assert_eq!(b.vat, Money::zero());
    }
}
