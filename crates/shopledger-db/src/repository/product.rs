//! # Product Repository
//!
//! Catalog operations plus the per-location stock ledger.
//!
//! ## Stock Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  product_stock (authoritative)        products.stock (mirror)       │
//! │                                                                     │
//! │  (P, Lagos)  quantity 12     ┐                                      │
//! │  (P, Abuja)  quantity  5     ├──  sum = 20  ──►  P.stock = 20       │
//! │  (P, Ikeja)  quantity  3     ┘                                      │
//! │                                                                     │
//! │  Every mutation touches BOTH inside one transaction. Availability   │
//! │  checks and sale decrements read the ledger; dashboards and the     │
//! │  low-stock count read the mirror.                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{DbError, DbResult};
use shopledger_core::validation::{validate_id, validate_name, validate_price_cents, validate_quantity, validate_sku};
use shopledger_core::{Product, ProductStock, ValidationError};

/// Parameters for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub org_id: String,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    /// Defaults to the configured low-stock threshold when not given.
    pub min_stock: Option<i64>,
    pub tax_exempt: bool,
}

/// Repository for product and stock-ledger operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    config: EngineConfig,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool, config: EngineConfig) -> Self {
        ProductRepository { pool, config }
    }

    /// Creates a product with zero stock everywhere.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, ProductError> {
        validate_id("org_id", &new.org_id)?;
        validate_sku(&new.sku)?;
        validate_name(&new.name)?;
        validate_price_cents(new.price_cents)?;
        if let Some(cost) = new.cost_cents {
            validate_price_cents(cost)?;
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            org_id: new.org_id.clone(),
            sku: new.sku.trim().to_string(),
            name: new.name.trim().to_string(),
            price_cents: new.price_cents,
            cost_cents: new.cost_cents,
            stock: 0,
            min_stock: new.min_stock.unwrap_or(self.config.default_min_stock),
            tax_exempt: new.tax_exempt,
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %product.sku, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, org_id, sku, name, price_cents, cost_cents,
                stock, min_stock, tax_exempt, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.org_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.tax_exempt)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(product)
    }

    /// Gets a product by id, scoped to the organization.
    pub async fn get(&self, org_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, org_id, sku, name, price_cents, cost_cents,
                   stock, min_stock, tax_exempt, created_at, updated_at
            FROM products
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by SKU, scoped to the organization.
    pub async fn get_by_sku(&self, org_id: &str, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, org_id, sku, name, price_cents, cost_cents,
                   stock, min_stock, tax_exempt, created_at, updated_at
            FROM products
            WHERE sku = ?1 AND org_id = ?2
            "#,
        )
        .bind(sku)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products for an organization, ordered by name.
    pub async fn list(&self, org_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, org_id, sku, name, price_cents, cost_cents,
                   stock, min_stock, tax_exempt, created_at, updated_at
            FROM products
            WHERE org_id = ?1
            ORDER BY name
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product's catalog fields (never its stock - stock moves
    /// only through `receive_stock` and the sale engine).
    pub async fn update_details(
        &self,
        org_id: &str,
        id: &str,
        name: &str,
        price_cents: i64,
        cost_cents: Option<i64>,
        min_stock: i64,
        tax_exempt: bool,
    ) -> Result<(), ProductError> {
        validate_name(name)?;
        validate_price_cents(price_cents)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?3,
                price_cents = ?4,
                cost_cents = ?5,
                min_stock = ?6,
                tax_exempt = ?7,
                updated_at = ?8
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(id)
        .bind(org_id)
        .bind(name.trim())
        .bind(price_cents)
        .bind(cost_cents)
        .bind(min_stock)
        .bind(tax_exempt)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(ProductError::Store(DbError::not_found("Product", id)));
        }

        Ok(())
    }

    /// Receives stock into a location.
    ///
    /// Upserts the (product, location) ledger row and increments the
    /// denormalized product total inside the same transaction - the inverse
    /// of the sale engine's decrement, with the same lockstep rule.
    pub async fn receive_stock(
        &self,
        org_id: &str,
        product_id: &str,
        location_id: &str,
        quantity: i64,
    ) -> Result<(), ProductError> {
        validate_id("org_id", org_id)?;
        validate_id("product_id", product_id)?;
        validate_id("location_id", location_id)?;
        validate_quantity(quantity)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        sqlx::query(
            r#"
            INSERT INTO product_stock (product_id, location_id, org_id, quantity, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (product_id, location_id) DO UPDATE SET
                quantity = quantity + excluded.quantity,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .bind(org_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock = stock + ?3,
                updated_at = ?4
            WHERE id = ?1 AND org_id = ?2
            "#,
        )
        .bind(product_id)
        .bind(org_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(ProductError::Store(DbError::not_found(
                "Product", product_id,
            )));
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(product_id = %product_id, location_id = %location_id, quantity = %quantity, "Stock received");
        Ok(())
    }

    /// Gets the ledger row for a (product, location) pair. `None` means the
    /// product is not stocked at the location.
    pub async fn stock_at(
        &self,
        org_id: &str,
        product_id: &str,
        location_id: &str,
    ) -> DbResult<Option<ProductStock>> {
        let stock = sqlx::query_as::<_, ProductStock>(
            r#"
            SELECT product_id, location_id, org_id, quantity, updated_at
            FROM product_stock
            WHERE product_id = ?1 AND location_id = ?2 AND org_id = ?3
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stock)
    }

    /// Lists products currently below their low-stock threshold.
    pub async fn low_stock(&self, org_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, org_id, sku, name, price_cents, cost_cents,
                   stock, min_stock, tax_exempt, created_at, updated_at
            FROM products
            WHERE org_id = ?1 AND stock < min_stock
            ORDER BY name
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts products for an organization (for diagnostics).
    pub async fn count(&self, org_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE org_id = ?1")
            .bind(org_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Errors from product operations.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
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
    use crate::repository::location::NewLocation;
    use crate::repository::organization::NewOrganization;

    async fn test_db() -> (Database, String, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let org = db
            .organizations()
            .create(&NewOrganization {
                name: "Test Traders".to_string(),
                jurisdiction: None,
            })
            .await
            .unwrap();
        let location = db
            .locations()
            .create(&NewLocation {
                org_id: org.id.clone(),
                name: "Main Branch".to_string(),
                address: None,
                city: None,
                state: None,
            })
            .await
            .unwrap();
        (db, org.id, location.id)
    }

    fn new_product(org_id: &str, sku: &str) -> NewProduct {
        NewProduct {
            org_id: org_id.to_string(),
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            price_cents: 10_000,
            cost_cents: Some(6_000),
            min_stock: None,
            tax_exempt: false,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_min_stock() {
        let (db, org_id, _) = test_db().await;
        let product = db
            .products()
            .create(&new_product(&org_id, "SKU-1"))
            .await
            .unwrap();

        assert_eq!(product.min_stock, 5);
        assert_eq!(product.stock, 0);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let (db, org_id, _) = test_db().await;
        db.products()
            .create(&new_product(&org_id, "SKU-1"))
            .await
            .unwrap();

        let err = db
            .products()
            .create(&new_product(&org_id, "SKU-1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProductError::Store(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_receive_stock_updates_ledger_and_mirror() {
        let (db, org_id, location_id) = test_db().await;
        let products = db.products();
        let product = products.create(&new_product(&org_id, "SKU-1")).await.unwrap();

        products
            .receive_stock(&org_id, &product.id, &location_id, 12)
            .await
            .unwrap();
        products
            .receive_stock(&org_id, &product.id, &location_id, 8)
            .await
            .unwrap();

        let ledger = products
            .stock_at(&org_id, &product.id, &location_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ledger.quantity, 20);

        let mirror = products.get(&org_id, &product.id).await.unwrap().unwrap();
        assert_eq!(mirror.stock, 20);
    }

    #[tokio::test]
    async fn test_low_stock_uses_per_product_threshold() {
        let (db, org_id, location_id) = test_db().await;
        let products = db.products();

        let low = products.create(&new_product(&org_id, "LOW-1")).await.unwrap();
        products
            .receive_stock(&org_id, &low.id, &location_id, 3)
            .await
            .unwrap();

        let mut custom = new_product(&org_id, "OK-1");
        custom.min_stock = Some(2);
        let ok = products.create(&custom).await.unwrap();
        products
            .receive_stock(&org_id, &ok.id, &location_id, 3)
            .await
            .unwrap();

        let low_stock = products.low_stock(&org_id).await.unwrap();
        let ids: Vec<_> = low_stock.iter().map(|p| p.id.as_str()).collect();
        assert!(ids.contains(&low.id.as_str())); // 3 < 5
        assert!(!ids.contains(&ok.id.as_str())); // 3 >= 2
    }

    #[tokio::test]
    async fn test_cross_org_reads_are_scoped() {
        let (db, org_id, _) = test_db().await;
        let other = db
            .organizations()
            .create(&NewOrganization {
                name: "Other Org".to_string(),
                jurisdiction: None,
            })
            .await
            .unwrap();

        let product = db
            .products()
            .create(&new_product(&org_id, "SKU-1"))
            .await
            .unwrap();

        assert!(db
            .products()
            .get(&other.id, &product.id)
            .await
            .unwrap()
            .is_none());
    }
}
