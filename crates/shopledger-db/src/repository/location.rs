//! # Location Repository
//!
//! Sale points (branches). The analytics engine uses these rows to resolve
//! legacy location-id report buckets to human-readable names.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopledger_core::validation::{validate_id, validate_name};
use shopledger_core::{Location, ValidationError};

/// Parameters for creating a location.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub org_id: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Repository for location records.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    /// Creates a location.
    pub async fn create(&self, new: &NewLocation) -> Result<Location, LocationError> {
        validate_id("org_id", &new.org_id)?;
        validate_name(&new.name)?;

        let location = Location {
            id: Uuid::new_v4().to_string(),
            org_id: new.org_id.clone(),
            name: new.name.trim().to_string(),
            address: new.address.clone(),
            city: new.city.clone(),
            state: new.state.clone(),
            created_at: Utc::now(),
        };

        debug!(id = %location.id, name = %location.name, "Creating location");

        sqlx::query(
            r#"
            INSERT INTO locations (id, org_id, name, address, city, state, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&location.id)
        .bind(&location.org_id)
        .bind(&location.name)
        .bind(&location.address)
        .bind(&location.city)
        .bind(&location.state)
        .bind(location.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(location)
    }

    /// Gets a location by id, scoped to the organization.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, org_id, name, address, city, state, created_at
            FROM locations
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    /// Lists all locations for an organization, ordered by name.
    pub async fn list(&self, org_id: &str) -> DbResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, org_id, name, address, city, state, created_at
            FROM locations
            WHERE org_id = ?1
            ORDER BY name
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }
}

/// Errors from location operations.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] DbError),
}
