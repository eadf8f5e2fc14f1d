//! # Organization Repository
//!
//! Tenant records. Session resolution and membership are handled by the
//! hosting platform; the engines only need the organization row for its
//! jurisdiction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use shopledger_core::validation::{validate_jurisdiction, validate_name};
use shopledger_core::{Organization, ValidationError, DEFAULT_JURISDICTION};

/// Parameters for creating an organization.
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    /// Defaults to "NG" when not given.
    pub jurisdiction: Option<String>,
}

/// Repository for organization records.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    pool: SqlitePool,
}

impl OrganizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrganizationRepository { pool }
    }

    /// Creates an organization.
    pub async fn create(&self, new: &NewOrganization) -> Result<Organization, OrganizationError> {
        validate_name(&new.name)?;
        let jurisdiction = new
            .jurisdiction
            .clone()
            .unwrap_or_else(|| DEFAULT_JURISDICTION.to_string());
        validate_jurisdiction(&jurisdiction)?;

        let org = Organization {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            jurisdiction,
            created_at: Utc::now(),
        };

        debug!(id = %org.id, name = %org.name, "Creating organization");

        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, jurisdiction, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&org.id)
        .bind(&org.name)
        .bind(&org.jurisdiction)
        .bind(org.created_at)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::from)?;

        Ok(org)
    }

    /// Gets an organization by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, jurisdiction, created_at
            FROM organizations
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(org)
    }

    /// Returns the jurisdiction code for an organization, when it exists.
    /// Used by the sale engine to resolve the VAT rate.
    pub async fn jurisdiction(&self, id: &str) -> DbResult<Option<String>> {
        let code = sqlx::query_scalar::<_, String>(
            "SELECT jurisdiction FROM organizations WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }
}

/// Errors from organization operations.
#[derive(Debug, thiserror::Error)]
pub enum OrganizationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] crate::error::DbError),
}
