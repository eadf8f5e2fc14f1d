//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## WAL Mode
//! WAL (Write-Ahead Logging) mode is enabled so that aggregation reads can
//! run concurrently with sale commits: readers don't block the writer and
//! the writer doesn't block readers. SQLite serializes writers, which is the
//! isolation the conditional stock decrement relies on.
//!
//! ## Lifecycle
//! The hosting process constructs a [`Database`] at startup, passes it (or
//! its repositories) into each operation explicitly, and closes it at
//! shutdown. The engines never own a global handle.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::analytics::AnalyticsRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::expense::ExpenseRepository;
use crate::repository::location::LocationRepository;
use crate::repository::organization::OrganizationRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::tax_rule::TaxRuleRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/shopledger/shopledger.db")
///     .max_connections(10);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    pub min_connections: u32,

    /// Connection acquire timeout.
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    pub run_migrations: bool,

    /// Engine tunables (income tax rate, low-stock default).
    pub engine: EngineConfig,
}

impl DbConfig {
    /// Creates a new database configuration with the given path. The file is
    /// created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
            engine: EngineConfig::default(),
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Sets the engine configuration.
    pub fn engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// In-memory SQLite requires a single connection: each connection would
    /// otherwise get its own empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
            engine: EngineConfig::default(),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cloning is cheap (the pool is internally reference-counted), so hosting
/// code can hand clones to concurrent request handlers.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    engine: EngineConfig,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite: WAL journal, NORMAL synchronous, foreign keys on
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            engine: config.engine.clone(),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations. Idempotent; also called by `new()` unless
    /// disabled in the config.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool, for queries not covered
    /// by the repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the engine configuration in effect.
    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    /// Returns the organization repository.
    pub fn organizations(&self) -> OrganizationRepository {
        OrganizationRepository::new(self.pool.clone())
    }

    /// Returns the location repository.
    pub fn locations(&self) -> LocationRepository {
        LocationRepository::new(self.pool.clone())
    }

    /// Returns the customer repository.
    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    /// Returns the product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone(), self.engine.clone())
    }

    /// Returns the tax rule repository.
    pub fn tax_rules(&self) -> TaxRuleRepository {
        TaxRuleRepository::new(self.pool.clone())
    }

    /// Returns the sale repository (the transaction engine).
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Returns the expense repository.
    pub fn expenses(&self) -> ExpenseRepository {
        ExpenseRepository::new(self.pool.clone())
    }

    /// Returns the analytics repository (the aggregation engine).
    pub fn analytics(&self) -> AnalyticsRepository {
        AnalyticsRepository::new(self.pool.clone(), self.engine.clone())
    }

    /// Closes the database connection pool. Call on shutdown; repository
    /// operations fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is responsive.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
