//! # Validation Module
//!
//! Boundary validators shared by the storage-layer repositories. Each
//! validator checks a single field and returns a typed error naming it.

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity or context id (organization, user, product, ...).
///
/// Ids issued by this system are UUIDs, but ids supplied by the session
/// resolver are opaque - so the rule is only: non-empty, at most 64 chars.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a SKU.
///
/// ## Rules
/// - Non-empty, at most 50 characters
/// - Alphanumeric plus hyphens and underscores
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }
    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }
    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, customer, location, organization).
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a jurisdiction code.
///
/// ## Rules
/// - Non-empty, at most 8 characters
/// - Uppercase letters and digits only (e.g. "NG", "NG-LA")
pub fn validate_jurisdiction(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "jurisdiction".to_string(),
        });
    }
    if code.len() > 8 {
        return Err(ValidationError::TooLong {
            field: "jurisdiction".to_string(),
            max: 8,
        });
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "jurisdiction".to_string(),
            reason: "must be uppercase letters, digits, or hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string format.
///
/// Ids issued by this system (products, sales, locations, customers) are
/// UUID v4 strings; use this where an id must be one of ours, and
/// [`validate_id`] where opaque external ids are acceptable.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value: positive and within the per-line limit.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or amount in minor units: non-negative (zero allowed
/// for free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points: 0 to 10000 (0% to 100%).
pub fn validate_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "rate_bps".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("org_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("org_id", "auth0|abc123").is_ok());
        assert!(validate_id("org_id", "").is_err());
        assert!(validate_id("org_id", "   ").is_err());
        assert!(validate_id("org_id", &"x".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("MILK-1L").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Peak Milk 1L").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_jurisdiction() {
        assert!(validate_jurisdiction("NG").is_ok());
        assert!(validate_jurisdiction("NG-LA").is_ok());
        assert!(validate_jurisdiction("").is_err());
        assert!(validate_jurisdiction("ng").is_err());
        assert!(validate_jurisdiction("TOOLONGCODE").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(9_999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(10_000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_rate_bps() {
        assert!(validate_rate_bps(0).is_ok());
        assert!(validate_rate_bps(750).is_ok());
        assert!(validate_rate_bps(10_000).is_ok());
        assert!(validate_rate_bps(10_001).is_err());
    }
}
