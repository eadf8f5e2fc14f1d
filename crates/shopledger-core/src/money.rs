//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In binary floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  VAT at 7.5% on 1,000.00 must be exactly 75.00 - not 74.999...     │
//! │  Monetary correctness is a contract, not a convenience.             │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Minor Units                                  │
//! │    Every amount is an i64 count of kobo/cents. Rates are integer   │
//! │    basis points. Rounding happens exactly once, explicitly.         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopledger_core::money::Money;
//! use shopledger_core::types::RateBps;
//!
//! let taxable = Money::from_cents(100_000); // 1,000.00
//! let vat = taxable.apply_rate(RateBps::from_bps(750)); // 7.5%
//! assert_eq!(vat.cents(), 7_500); // 75.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::RateBps;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (kobo for NGN, cents for
/// USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: profit figures can legitimately be negative
/// - **Single-field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support, so report records serialize as plain
///   integers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use shopledger_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps a negative value to zero.
    ///
    /// Used for figures that must not go below zero, e.g. estimated income
    /// tax on a loss-making period.
    #[inline]
    pub const fn max_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Applies a basis-point rate, rounding half-up at the minor unit.
    ///
    /// ## Rounding Rule
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────┐
    /// │  ROUND HALF-UP, ONCE                                            │
    /// │                                                                 │
    /// │  amount × bps / 10000, with exactly .5 minor units rounding     │
    /// │  away from zero:                                                │
    /// │    1000 × 825 bps = 82.5  → 83                                  │
    /// │    1000 × 824 bps = 82.4  → 82                                  │
    /// │                                                                 │
    /// │  The rule is applied ONCE to a total, never per line - summing  │
    /// │  per-line roundings drifts by up to a minor unit per line.      │
    /// └─────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Implementation
    /// Integer math in i128 to prevent overflow on large amounts:
    /// `(amount * bps + 5000) / 10000` for non-negative amounts, mirrored
    /// for negative ones (half away from zero).
    ///
    /// ## Example
    /// ```rust
    /// use shopledger_core::money::Money;
    /// use shopledger_core::types::RateBps;
    ///
    /// let amount = Money::from_cents(1000); // 10.00
    /// let tax = amount.apply_rate(RateBps::from_bps(750)); // 7.5%
    /// assert_eq!(tax.cents(), 75); // 0.75
    /// ```
    pub fn apply_rate(&self, rate: RateBps) -> Money {
        let num = self.0 as i128 * rate.bps() as i128;
        let cents = if num >= 0 {
            (num + 5_000) / 10_000
        } else {
            -((-num + 5_000) / 10_000)
        };
        Money::from_cents(cents as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use shopledger_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable decimal format.
///
/// This is for logs and debugging; currency formatting for end users is a
/// presentation-layer concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
