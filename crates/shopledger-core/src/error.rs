//! # Error Types
//!
//! Domain-specific error types for shopledger-core.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impls)
//! 2. Include context in error messages (line index, offending value)
//! 3. Errors are enum variants, never strings
//!
//! The storage layer wraps these into its own taxonomy; see
//! `shopledger-db::repository::sale::SaleError` for the full surface the
//! transaction engine exposes to callers.

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors raised at the boundary, before business logic
/// runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed jurisdiction code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Sale Validation Error
// =============================================================================

/// Rejections raised by the sale pre-mutation validation pass.
///
/// All of these are detected before any store write; a draft failing any
/// check leaves no trace. The line index identifies the offending cart line
/// (0-based).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleValidationError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// No sale location given. Location is mandatory so branch performance
    /// can be tracked.
    #[error("sale location is required")]
    MissingLocation,

    /// A line has a non-positive or over-limit quantity.
    #[error("line {line}: invalid quantity {quantity}")]
    InvalidQuantity { line: usize, quantity: i64 },

    /// A line has a negative unit price.
    #[error("line {line}: invalid unit price {unit_price_cents}")]
    InvalidUnitPrice { line: usize, unit_price_cents: i64 },

    /// A line has a negative unit cost.
    #[error("line {line}: invalid unit cost {unit_cost_cents}")]
    InvalidUnitCost { line: usize, unit_cost_cents: i64 },

    /// The cart exceeds the maximum number of lines.
    #[error("cart cannot have more than {max} lines")]
    TooManyLines { max: usize },
}

// =============================================================================
// Unit Tests
// =============================================================================
