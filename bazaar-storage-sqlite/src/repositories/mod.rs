//! Repository implementations for SQLite storage

pub mod password;
pub mod purchase;
pub mod user;

pub use password::SqlitePasswordRepository;
pub use purchase::SqlitePurchaseRepository;
pub use user::SqliteUserRepository;

use async_trait::async_trait;
use bazaar_core::{
    Error,
    error::{StorageError, utilities::DatabaseResultExt},
    repositories::{
        PasswordRepositoryProvider, PurchaseRepositoryProvider, RepositoryProvider,
        UserRepositoryProvider,
    },
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::Arc;

use crate::migrations::{self, MigrationManager, SqliteMigrationManager};

/// Repository provider implementation for SQLite
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    user: Arc<SqliteUserRepository>,
    password: Arc<SqlitePasswordRepository>,
    purchase: Arc<SqlitePurchaseRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let user = Arc::new(SqliteUserRepository::new(pool.clone()));
        let password = Arc::new(SqlitePasswordRepository::new(pool.clone()));
        let purchase = Arc::new(SqlitePurchaseRepository::new(pool.clone()));

        Self {
            pool,
            user,
            password,
            purchase,
        }
    }

    /// Open a pool for `database_url`
    ///
    /// In-memory databases get a single connection so every query sees the
    /// same database.
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to database");
                Error::Storage(StorageError::Connection(e.to_string()))
            })?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl UserRepositoryProvider for SqliteRepositoryProvider {
    type UserRepo = SqliteUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.user
    }
}

impl PasswordRepositoryProvider for SqliteRepositoryProvider {
    type PasswordRepo = SqlitePasswordRepository;

    fn password(&self) -> &Self::PasswordRepo {
        &self.password
    }
}

impl PurchaseRepositoryProvider for SqliteRepositoryProvider {
    type PurchaseRepo = SqlitePurchaseRepository;

    fn purchase(&self) -> &Self::PurchaseRepo {
        &self.purchase
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&migrations::all()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_db_err_with_context("Health check failed")?;
        Ok(())
    }
}
