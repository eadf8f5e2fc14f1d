//! # Tax Rule Repository
//!
//! CRUD for time-bounded tax rules plus the active-rate resolution the sale
//! engine calls at commit time.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  resolve_active_rate(org, "NG", "VAT", as_of)                       │
//! │                                                                     │
//! │  candidates: effective_from <= as_of                                │
//! │              AND (effective_to IS NULL OR as_of < effective_to)     │
//! │                                                                     │
//! │  ── exactly one ──► its rate                                        │
//! │  ── several (legacy overlapping data) ──► latest effective_from     │
//! │     wins, id as final tie-break: deterministic, documented          │
//! │  ── none ──► None; the sale engine applies rate 0 EXPLICITLY        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Creation and update reject ranges that would overlap an existing rule
//! for the same (org, jurisdiction, type), so new data can't produce the
//! "several candidates" case; the resolution order still handles rows that
//! predate this check.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopledger_core::validation::{validate_id, validate_jurisdiction, validate_rate_bps};
use shopledger_core::{
    RateBps, TaxRule, ValidationError, DEFAULT_JURISDICTION, DEFAULT_VAT_RATE_BPS, VAT_TAX_TYPE,
};

/// Parameters for creating a tax rule.
#[derive(Debug, Clone)]
pub struct NewTaxRule {
    pub org_id: String,
    pub jurisdiction: String,
    pub tax_type: String,
    pub rate_bps: u32,
    pub effective_from: DateTime<Utc>,
    /// Open-ended when `None`.
    pub effective_to: Option<DateTime<Utc>>,
}

/// Repository for tax rules.
#[derive(Debug, Clone)]
pub struct TaxRuleRepository {
    pool: SqlitePool,
}

impl TaxRuleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TaxRuleRepository { pool }
    }

    /// Creates a tax rule, rejecting ranges that overlap an existing rule
    /// for the same (organization, jurisdiction, type).
    pub async fn create(&self, new: &NewTaxRule) -> Result<TaxRule, TaxRuleError> {
        validate_id("org_id", &new.org_id)?;
        validate_jurisdiction(&new.jurisdiction)?;
        validate_rate_bps(new.rate_bps)?;
        if let Some(to) = new.effective_to {
            if to <= new.effective_from {
                return Err(TaxRuleError::EmptyRange);
            }
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        if let Some(existing_id) =
            overlapping_rule(&mut tx, new, None).await.map_err(DbError::from)?
        {
            return Err(TaxRuleError::Overlap { existing_id });
        }

        let now = Utc::now();
        let rule = TaxRule {
            id: Uuid::new_v4().to_string(),
            org_id: new.org_id.clone(),
            jurisdiction: new.jurisdiction.clone(),
            tax_type: new.tax_type.clone(),
            rate_bps: new.rate_bps,
            effective_from: new.effective_from,
            effective_to: new.effective_to,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO tax_rules (
                id, org_id, jurisdiction, tax_type, rate_bps,
                effective_from, effective_to, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&rule.id)
        .bind(&rule.org_id)
        .bind(&rule.jurisdiction)
        .bind(&rule.tax_type)
        .bind(rule.rate_bps)
        .bind(rule.effective_from)
        .bind(rule.effective_to)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %rule.id, jurisdiction = %rule.jurisdiction, rate_bps = rule.rate_bps, "Tax rule created");
        Ok(rule)
    }

    /// Updates a rule's rate and effective range, with the same overlap
    /// check (excluding the rule itself).
    pub async fn update(
        &self,
        org_id: &str,
        id: &str,
        rate_bps: u32,
        effective_from: DateTime<Utc>,
        effective_to: Option<DateTime<Utc>>,
    ) -> Result<TaxRule, TaxRuleError> {
        validate_rate_bps(rate_bps)?;
        if let Some(to) = effective_to {
            if to <= effective_from {
                return Err(TaxRuleError::EmptyRange);
            }
        }

        let existing = self
            .get(org_id, id)
            .await?
            .ok_or_else(|| TaxRuleError::Store(DbError::not_found("TaxRule", id)))?;

        let probe = NewTaxRule {
            org_id: existing.org_id.clone(),
            jurisdiction: existing.jurisdiction.clone(),
            tax_type: existing.tax_type.clone(),
            rate_bps,
            effective_from,
            effective_to,
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        if let Some(existing_id) = overlapping_rule(&mut tx, &probe, Some(id))
            .await
            .map_err(DbError::from)?
        {
            return Err(TaxRuleError::Overlap { existing_id });
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE tax_rules SET
                rate_bps = ?3,
                effective_from = ?4,
                effective_to = ?5,
                updated_at = ?6
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(rate_bps)
        .bind(effective_from)
        .bind(effective_to)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(TaxRule {
            rate_bps,
            effective_from,
            effective_to,
            updated_at: now,
            ..existing
        })
    }

    /// Deletes a rule.
    pub async fn delete(&self, org_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM tax_rules WHERE id = ?1 AND org_id = ?2")
            .bind(id)
            .bind(org_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("TaxRule", id));
        }

        Ok(())
    }

    /// Gets a rule by id, scoped to the organization.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<TaxRule>> {
        let rule = sqlx::query_as::<_, TaxRule>(
            r#"
            SELECT id, org_id, jurisdiction, tax_type, rate_bps,
                   effective_from, effective_to, created_at, updated_at
            FROM tax_rules
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rule)
    }

    /// Lists rules for an organization, optionally filtered by jurisdiction,
    /// newest effective range first.
    pub async fn list(&self, org_id: &str, jurisdiction: Option<&str>) -> DbResult<Vec<TaxRule>> {
        let rules = match jurisdiction {
            Some(code) => {
                sqlx::query_as::<_, TaxRule>(
                    r#"
                    SELECT id, org_id, jurisdiction, tax_type, rate_bps,
                           effective_from, effective_to, created_at, updated_at
                    FROM tax_rules
                    WHERE org_id = ?1 AND jurisdiction = ?2
                    ORDER BY effective_from DESC
                    "#,
                )
                .bind(org_id)
                .bind(code)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, TaxRule>(
                    r#"
                    SELECT id, org_id, jurisdiction, tax_type, rate_bps,
                           effective_from, effective_to, created_at, updated_at
                    FROM tax_rules
                    WHERE org_id = ?1
                    ORDER BY effective_from DESC
                    "#,
                )
                .bind(org_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rules)
    }

    /// Resolves the rate active at `as_of` for (org, jurisdiction, type).
    ///
    /// Returns `None` when no rule matches - NOT an error. The caller
    /// decides what absence means (the sale engine applies rate zero,
    /// explicitly). Among several matches the latest `effective_from` wins,
    /// id as final tie-break.
    pub async fn resolve_active_rate(
        &self,
        org_id: &str,
        jurisdiction: &str,
        tax_type: &str,
        as_of: DateTime<Utc>,
    ) -> DbResult<Option<RateBps>> {
        let rate = sqlx::query_scalar::<_, u32>(
            r#"
            SELECT rate_bps
            FROM tax_rules
            WHERE org_id = ?1
              AND jurisdiction = ?2
              AND tax_type = ?3
              AND effective_from <= ?4
              AND (effective_to IS NULL OR ?4 < effective_to)
            ORDER BY effective_from DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(org_id)
        .bind(jurisdiction)
        .bind(tax_type)
        .bind(as_of)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rate.map(RateBps::from_bps))
    }

    /// Seeds the default VAT rule (NG, 7.5%, effective now, open-ended) if
    /// no VAT rule exists yet for the organization's default jurisdiction.
    ///
    /// Idempotent: the insert is guarded by a NOT EXISTS on the same triple,
    /// so calling it twice - or concurrently - creates exactly one rule.
    /// Returns the created rule, or `None` when one already existed.
    pub async fn seed_default_vat(&self, org_id: &str) -> DbResult<Option<TaxRule>> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO tax_rules (
                id, org_id, jurisdiction, tax_type, rate_bps,
                effective_from, effective_to, created_at, updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, NULL, ?6, ?6
            WHERE NOT EXISTS (
                SELECT 1 FROM tax_rules
                WHERE org_id = ?2 AND jurisdiction = ?3 AND tax_type = ?4
            )
            "#,
        )
        .bind(&id)
        .bind(org_id)
        .bind(DEFAULT_JURISDICTION)
        .bind(VAT_TAX_TYPE)
        .bind(DEFAULT_VAT_RATE_BPS)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(org_id = %org_id, "Default VAT rule already present; seed skipped");
            return Ok(None);
        }

        info!(org_id = %org_id, rate_bps = DEFAULT_VAT_RATE_BPS, "Default VAT rule seeded");
        self.get(org_id, &id).await
    }
}

/// Finds a rule whose effective range intersects the probe's, for the same
/// (org, jurisdiction, type). `exclude_id` skips the rule being updated.
/// Two ranges [a, b) and [c, d) intersect when a < d and c < b, with NULL
/// ends treated as infinity.
async fn overlapping_rule(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    probe: &NewTaxRule,
    exclude_id: Option<&str>,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT id FROM tax_rules
        WHERE org_id = ?1
          AND jurisdiction = ?2
          AND tax_type = ?3
          AND (?6 IS NULL OR id != ?6)
          AND (effective_to IS NULL OR effective_to > ?4)
          AND (?5 IS NULL OR effective_from < ?5)
        LIMIT 1
        "#,
    )
    .bind(&probe.org_id)
    .bind(&probe.jurisdiction)
    .bind(&probe.tax_type)
    .bind(probe.effective_from)
    .bind(probe.effective_to)
    .bind(exclude_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Errors from tax rule operations.
#[derive(Debug, thiserror::Error)]
pub enum TaxRuleError {
    /// The requested range intersects an existing rule's range.
    #[error("effective range overlaps existing rule {existing_id}")]
    Overlap { existing_id: String },

    /// effective_to must be strictly after effective_from.
    #[error("effective range is empty")]
    EmptyRange,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] DbError),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::organization::NewOrganization;
    use chrono::Duration;

    async fn test_db() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let org = db
            .organizations()
            .create(&NewOrganization {
                name: "Test Traders".to_string(),
                jurisdiction: None,
            })
            .await
            .unwrap();
        (db, org.id)
    }

    fn rule(org_id: &str, rate_bps: u32, from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> NewTaxRule {
        NewTaxRule {
            org_id: org_id.to_string(),
            jurisdiction: "NG".to_string(),
            tax_type: "VAT".to_string(),
            rate_bps,
            effective_from: from,
            effective_to: to,
        }
    }

    #[tokio::test]
    async fn test_seed_default_vat_is_idempotent() {
        let (db, org_id) = test_db().await;
        let rules = db.tax_rules();

        let first = rules.seed_default_vat(&org_id).await.unwrap();
        assert!(first.is_some());
        let seeded = first.unwrap();
        assert_eq!(seeded.jurisdiction, "NG");
        assert_eq!(seeded.tax_type, "VAT");
        assert_eq!(seeded.rate_bps, 750);
        assert!(seeded.effective_to.is_none());

        let second = rules.seed_default_vat(&org_id).await.unwrap();
        assert!(second.is_none());

        let all = rules.list(&org_id, Some("NG")).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_respects_effective_window() {
        let (db, org_id) = test_db().await;
        let rules = db.tax_rules();
        let now = Utc::now();

        rules
            .create(&rule(
                &org_id,
                500,
                now - Duration::days(365),
                Some(now - Duration::days(30)),
            ))
            .await
            .unwrap();
        rules
            .create(&rule(&org_id, 750, now - Duration::days(30), None))
            .await
            .unwrap();

        // Today: the open-ended 7.5% rule is active.
        let rate = rules
            .resolve_active_rate(&org_id, "NG", "VAT", now)
            .await
            .unwrap();
        assert_eq!(rate, Some(RateBps::from_bps(750)));

        // Two months ago: the old 5% rule was active.
        let rate = rules
            .resolve_active_rate(&org_id, "NG", "VAT", now - Duration::days(60))
            .await
            .unwrap();
        assert_eq!(rate, Some(RateBps::from_bps(500)));

        // Before any rule: none.
        let rate = rules
            .resolve_active_rate(&org_id, "NG", "VAT", now - Duration::days(400))
            .await
            .unwrap();
        assert_eq!(rate, None);
    }

    #[tokio::test]
    async fn test_resolve_none_for_other_jurisdiction() {
        let (db, org_id) = test_db().await;
        let rules = db.tax_rules();
        rules.seed_default_vat(&org_id).await.unwrap();

        let rate = rules
            .resolve_active_rate(&org_id, "GH", "VAT", Utc::now())
            .await
            .unwrap();
        assert_eq!(rate, None);
    }

    #[tokio::test]
    async fn test_create_rejects_overlap() {
        let (db, org_id) = test_db().await;
        let rules = db.tax_rules();
        let now = Utc::now();

        rules
            .create(&rule(&org_id, 750, now - Duration::days(30), None))
            .await
            .unwrap();

        // Open-ended existing rule overlaps everything after its start.
        let err = rules
            .create(&rule(&org_id, 1000, now, None))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxRuleError::Overlap { .. }));

        // A range that ends before the existing rule starts is fine.
        rules
            .create(&rule(
                &org_id,
                500,
                now - Duration::days(365),
                Some(now - Duration::days(30)),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_empty_range() {
        let (db, org_id) = test_db().await;
        let now = Utc::now();
        let err = db
            .tax_rules()
            .create(&rule(&org_id, 750, now, Some(now)))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxRuleError::EmptyRange));
    }

    #[tokio::test]
    async fn test_delete_scoped_to_org() {
        let (db, org_id) = test_db().await;
        let rules = db.tax_rules();
        let created = rules.seed_default_vat(&org_id).await.unwrap().unwrap();

        assert!(rules.delete("other-org", &created.id).await.is_err());
        rules.delete(&org_id, &created.id).await.unwrap();
        assert!(rules.get(&org_id, &created.id).await.unwrap().is_none());
    }
}
