//! Builder pattern for constructing Bazaar instances
//!
//! Storage has to be chosen before [`BazaarBuilder::build`] becomes available;
//! the type-state markers enforce that at compile time.
//!
//! # Example
//!
//! ```rust,no_run
//! use bazaar::BazaarBuilder;
//! use chrono::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bazaar = BazaarBuilder::new()
//!         .with_sqlite("sqlite://bazaar.db?mode=rwc")
//!         .await?
//!         .with_max_failed_attempts(3)
//!         .with_lockout_period(Duration::minutes(10))
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use bazaar_core::{
    AttemptStoreConfig, Clock, LoginGuardConfig, SystemClock, repositories::RepositoryProvider,
};
use chrono::Duration;

use crate::Bazaar;

/// Errors that can occur when building a Bazaar instance.
#[derive(Debug, thiserror::Error)]
pub enum BazaarBuilderError {
    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Marker type indicating no storage has been configured yet.
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

/// A type-safe builder for constructing [`Bazaar`] instances.
///
/// # Defaults
///
/// - Login guard: enabled, 5 failed attempts, 30 minute lockout
/// - Attempt table: 100 000 identities, idle entries dropped after 24 hours
/// - Clock: system time
/// - Apply migrations: false
pub struct BazaarBuilder<Storage> {
    storage: Storage,
    guard_config: LoginGuardConfig,
    store_config: AttemptStoreConfig,
    clock: Arc<dyn Clock>,
    apply_migrations: bool,
}

impl Default for BazaarBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl BazaarBuilder<NoStorage> {
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            guard_config: LoginGuardConfig::default(),
            store_config: AttemptStoreConfig::default(),
            clock: Arc::new(SystemClock),
            apply_migrations: false,
        }
    }

    /// Use an existing repository provider.
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> BazaarBuilder<WithStorage<R>> {
        BazaarBuilder {
            storage: WithStorage { repositories },
            guard_config: self.guard_config,
            store_config: self.store_config,
            clock: self.clock,
            apply_migrations: self.apply_migrations,
        }
    }
}

#[cfg(feature = "sqlite")]
impl BazaarBuilder<NoStorage> {
    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite::memory:" or "sqlite://bazaar.db?mode=rwc")
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<BazaarBuilder<WithStorage<crate::SqliteRepositoryProvider>>, BazaarBuilderError>
    {
        let provider = crate::SqliteRepositoryProvider::connect(url)
            .await
            .map_err(|e| BazaarBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(provider)))
    }

    /// Configure SQLite storage with an existing connection pool.
    pub fn with_sqlite_pool(
        self,
        pool: sqlx::SqlitePool,
    ) -> BazaarBuilder<WithStorage<crate::SqliteRepositoryProvider>> {
        self.with_repositories(Arc::new(crate::SqliteRepositoryProvider::new(pool)))
    }
}

impl<S> BazaarBuilder<S> {
    /// Replace the whole login guard configuration.
    pub fn with_login_guard_config(mut self, config: LoginGuardConfig) -> Self {
        self.guard_config = config;
        self
    }

    /// Number of consecutive failed logins that locks an email.
    pub fn with_max_failed_attempts(mut self, max_failed_attempts: u32) -> Self {
        self.guard_config.max_failed_attempts = max_failed_attempts;
        self
    }

    /// How long a locked email stays locked after its last failure.
    pub fn with_lockout_period(mut self, lockout_period: Duration) -> Self {
        self.guard_config.lockout_period = lockout_period;
        self
    }

    /// Turn login throttling off entirely.
    pub fn disable_login_guard(mut self) -> Self {
        self.guard_config.enabled = false;
        self
    }

    pub fn with_attempt_store_config(mut self, config: AttemptStoreConfig) -> Self {
        self.store_config = config;
        self
    }

    /// Use a different time source, mostly useful in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run database migrations as part of [`build`](BazaarBuilder::build).
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }
}

impl<R: RepositoryProvider> BazaarBuilder<WithStorage<R>> {
    /// Build the Bazaar instance.
    ///
    /// Runs migrations first if `apply_migrations(true)` was called.
    pub async fn build(self) -> Result<Bazaar<R>, BazaarBuilderError> {
        if self.guard_config.max_failed_attempts == 0 {
            return Err(BazaarBuilderError::InvalidConfiguration(
                "max_failed_attempts must be at least 1".to_string(),
            ));
        }

        if self.guard_config.lockout_period <= Duration::zero() {
            return Err(BazaarBuilderError::InvalidConfiguration(
                "lockout_period must be positive".to_string(),
            ));
        }

        if self.apply_migrations {
            self.storage
                .repositories
                .migrate()
                .await
                .map_err(|e| BazaarBuilderError::Migration(e.to_string()))?;
        }

        tracing::debug!(
            enabled = self.guard_config.enabled,
            max_failed_attempts = self.guard_config.max_failed_attempts,
            lockout_minutes = self.guard_config.lockout_period.num_minutes(),
            "Login guard configured"
        );

        Ok(Bazaar::from_parts(
            self.storage.repositories,
            self.guard_config,
            self.store_config,
            self.clock,
        ))
    }
}
