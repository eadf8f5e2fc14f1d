//! # Expense Repository
//!
//! Operating expenses. The analytics summary subtracts the windowed expense
//! total from gross profit; `occurred_on` (not the insertion time) places an
//! expense in a window, so back-dated entries land in the right period.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopledger_core::validation::validate_id;
use shopledger_core::{Expense, ValidationError, Window};

/// Parameters for recording an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub org_id: String,
    pub amount_cents: i64,
    pub category: String,
    /// When the expense was incurred (may be in the past).
    pub occurred_on: DateTime<Utc>,
}

/// Repository for expense records.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records an expense.
    pub async fn record(&self, new: &NewExpense) -> Result<Expense, ExpenseError> {
        validate_id("org_id", &new.org_id)?;
        if new.amount_cents <= 0 {
            return Err(ExpenseError::Validation(ValidationError::MustBePositive {
                field: "amount".to_string(),
            }));
        }
        if new.category.trim().is_empty() {
            return Err(ExpenseError::Validation(ValidationError::Required {
                field: "category".to_string(),
            }));
        }

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            org_id: new.org_id.clone(),
            amount_cents: new.amount_cents,
            category: new.category.trim().to_string(),
            occurred_on: new.occurred_on,
            created_at: Utc::now(),
        };

        debug!(id = %expense.id, category = %expense.category, amount = expense.amount_cents, "Recording expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (id, org_id, amount_cents, category, occurred_on, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.org_id)
        .bind(expense.amount_cents)
        .bind(&expense.category)
        .bind(expense.occurred_on)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(expense)
    }

    /// Lists expenses whose occurrence falls inside the window, newest
    /// first.
    pub async fn list_window(&self, org_id: &str, window: Window) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, org_id, amount_cents, category, occurred_on, created_at
            FROM expenses
            WHERE org_id = ?1 AND occurred_on >= ?2 AND occurred_on < ?3
            ORDER BY occurred_on DESC
            "#,
        )
        .bind(org_id)
        .bind(window.from)
        .bind(window.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }
}

/// Errors from expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] DbError),
}

// =============================================================================
// Unit Tests
// =============================================================================
