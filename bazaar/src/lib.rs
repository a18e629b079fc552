//! # Bazaar
//!
//! Bazaar is a small backend for user accounts and purchase records. Password
//! logins go through a login guard that locks an email out for a while after
//! too many consecutive failures.
//!
//! [`Bazaar`] wires the services from `bazaar-core` to a storage backend and
//! is the type application code (such as the HTTP layer in `bazaar-axum`)
//! talks to.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bazaar::BazaarBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bazaar = BazaarBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let user = bazaar
//!         .create_user("Alice", "alice@example.com", "Secr3t!pw", "Secr3t!pw")
//!         .await?;
//!     let login = bazaar.login("alice@example.com", "Secr3t!pw").await?;
//!     assert_eq!(login.user_id, user.id);
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use bazaar_core::{
    repositories::{PasswordRepositoryAdapter, PurchaseRepositoryAdapter, UserRepositoryAdapter},
    services::{AuthenticationService, PasswordService, PurchaseService, UserService},
};

mod builder;

pub use builder::{BazaarBuilder, BazaarBuilderError, NoStorage, WithStorage};

/// Re-export core types from bazaar_core
pub use bazaar_core::{
    AttemptStoreConfig, Clock, Error, InMemoryAttemptStore, LockoutStatus, LoginGuard,
    LoginGuardConfig, LoginResponse, ManualClock, Page, Purchase, PurchaseId, SystemClock, User,
    UserId, UserListQuery, UserSummary, repositories::RepositoryProvider,
};

/// Error taxonomy shared by every layer
pub use bazaar_core::error;

/// Re-export storage backends
#[cfg(feature = "sqlite")]
pub use bazaar_storage_sqlite::SqliteRepositoryProvider;

pub type Result<T> = std::result::Result<T, Error>;

type Users<R> = UserRepositoryAdapter<R>;
type Passwords<R> = PasswordRepositoryAdapter<R>;

/// The coordinator that owns the services and the login guard.
///
/// One instance is created at startup and shared (usually behind an `Arc`)
/// by every request handler. The login guard's attempt table lives inside it,
/// so all logins in the process must go through the same instance.
pub struct Bazaar<R: RepositoryProvider> {
    repositories: Arc<R>,
    user_service: Arc<UserService<Users<R>, Passwords<R>>>,
    purchase_service: Arc<PurchaseService<PurchaseRepositoryAdapter<R>>>,
    authentication_service:
        Arc<AuthenticationService<Users<R>, Passwords<R>, InMemoryAttemptStore>>,
    login_guard: Arc<LoginGuard<InMemoryAttemptStore>>,
}

impl<R: RepositoryProvider> Bazaar<R> {
    /// Create a Bazaar instance with default login guard settings
    pub fn new(repositories: Arc<R>) -> Self {
        Self::from_parts(
            repositories,
            LoginGuardConfig::default(),
            AttemptStoreConfig::default(),
            Arc::new(SystemClock),
        )
    }

    pub(crate) fn from_parts(
        repositories: Arc<R>,
        guard_config: LoginGuardConfig,
        store_config: AttemptStoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // An entry may only age out once its lockout can no longer matter.
        let store_config = AttemptStoreConfig {
            idle_ttl: store_config.idle_ttl.max(guard_config.lockout_period),
            failure_retention: store_config
                .failure_retention
                .max(guard_config.lockout_period),
            ..store_config
        };

        let user_repo = Arc::new(UserRepositoryAdapter::new(repositories.clone()));
        let password_repo = Arc::new(PasswordRepositoryAdapter::new(repositories.clone()));
        let purchase_repo = Arc::new(PurchaseRepositoryAdapter::new(repositories.clone()));

        let password_service = Arc::new(PasswordService::new(user_repo.clone(), password_repo));
        let user_service = Arc::new(UserService::new(user_repo, password_service.clone()));
        let purchase_service = Arc::new(PurchaseService::new(purchase_repo));

        let store = Arc::new(InMemoryAttemptStore::new(store_config, clock.clone()));
        let login_guard = Arc::new(LoginGuard::new(store, clock, guard_config));
        let authentication_service = Arc::new(AuthenticationService::new(
            login_guard.clone(),
            password_service,
        ));

        Self {
            repositories,
            user_service,
            purchase_service,
            authentication_service,
            login_guard,
        }
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<()> {
        self.repositories.migrate().await
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<()> {
        self.repositories.health_check().await
    }

    pub fn login_guard(&self) -> &Arc<LoginGuard<InMemoryAttemptStore>> {
        &self.login_guard
    }

    /// Spawn the background sweep of the login attempt table
    ///
    /// The task stops when `shutdown` changes.
    pub fn start_eviction_task(
        &self,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        self.login_guard.start_eviction_task(shutdown)
    }

    // Authentication

    /// Log in with email and password
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidCredentials` for an unknown email or wrong password
    /// - `AuthError::TooManyAttempts` while the email is locked out
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        self.authentication_service.login(email, password).await
    }

    pub async fn lockout_status(&self, email: &str) -> Result<LockoutStatus> {
        self.login_guard.lockout_status(email.trim()).await
    }

    /// Clear the failed attempts of an email, returning whether it was locked
    pub async fn unlock(&self, email: &str) -> Result<bool> {
        self.login_guard.unlock(email.trim()).await
    }

    // Users

    pub async fn list_users(&self, query: &UserListQuery) -> Result<Page<UserSummary>> {
        self.user_service.list_users(query).await
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<User> {
        self.user_service.get_user(user_id).await
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User> {
        self.user_service
            .create_user(name, email, password, password_confirm)
            .await
    }

    pub async fn update_user(&self, user_id: &UserId, name: &str, email: &str) -> Result<User> {
        self.user_service.update_user(user_id, name, email).await
    }

    pub async fn delete_user(&self, user_id: &UserId) -> Result<()> {
        self.user_service.delete_user(user_id).await
    }

    /// Change a user's password
    ///
    /// Wrong current passwords count toward the email's login lockout.
    pub async fn change_password(
        &self,
        user_id: &UserId,
        old_password: &str,
        new_password: &str,
        new_password_confirm: &str,
    ) -> Result<()> {
        let user = self.user_service.get_user(user_id).await?;
        self.authentication_service
            .change_password(&user, old_password, new_password, new_password_confirm)
            .await
    }

    // Purchases

    pub async fn create_purchase(
        &self,
        product: &str,
        description: &str,
        price: f64,
        quantity: f64,
    ) -> Result<Purchase> {
        self.purchase_service
            .create_purchase(product, description, price, quantity)
            .await
    }

    pub async fn list_purchases(&self) -> Result<Vec<Purchase>> {
        self.purchase_service.list_purchases().await
    }

    pub async fn get_purchase(&self, id: &PurchaseId) -> Result<Purchase> {
        self.purchase_service.get_purchase(id).await
    }

    pub async fn update_purchase(
        &self,
        id: &PurchaseId,
        price: f64,
        quantity: f64,
    ) -> Result<Purchase> {
        self.purchase_service
            .update_purchase(id, price, quantity)
            .await
    }

    pub async fn delete_purchase(&self, id: &PurchaseId) -> Result<()> {
        self.purchase_service.delete_purchase(id).await
    }
}
