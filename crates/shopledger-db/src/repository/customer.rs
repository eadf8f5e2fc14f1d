//! # Customer Repository
//!
//! Customer records, including the geographic attributes (city, state, LGA,
//! country) the customer performance report carries through for display.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopledger_core::validation::{validate_id, validate_name};
use shopledger_core::{Customer, ValidationError};

/// Parameters for creating a customer.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub org_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub country: Option<String>,
}

/// Repository for customer records.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates a customer.
    pub async fn create(&self, new: &NewCustomer) -> Result<Customer, CustomerError> {
        validate_id("org_id", &new.org_id)?;
        validate_name(&new.name)?;

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            org_id: new.org_id.clone(),
            name: new.name.trim().to_string(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            city: new.city.clone(),
            state: new.state.clone(),
            lga: new.lga.clone(),
            country: new.country.clone(),
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, name = %customer.name, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, org_id, name, email, phone,
                city, state, lga, country, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.org_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.city)
        .bind(&customer.state)
        .bind(&customer.lga)
        .bind(&customer.country)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(customer)
    }

    /// Gets a customer by id, scoped to the organization.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, org_id, name, email, phone, city, state, lga, country, created_at
            FROM customers
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists all customers for an organization, ordered by name.
    pub async fn list(&self, org_id: &str) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, org_id, name, email, phone, city, state, lga, country, created_at
            FROM customers
            WHERE org_id = ?1
            ORDER BY name
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }
}

/// Errors from customer operations.
#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] DbError),
}
