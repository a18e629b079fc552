//! Repository traits for the data access layer
//!
//! Services talk to storage only through these traits.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits give access to each repository type
//! - [`RepositoryProvider`] combines all provider traits plus lifecycle methods
//!
//! [`AttemptStore`] is deliberately not part of [`RepositoryProvider`]: login
//! attempt records are process-local and owned by the login guard, not by the
//! persistence layer.

pub mod adapter;
pub mod attempt;
pub mod password;
pub mod purchase;
pub mod user;

pub use adapter::{PasswordRepositoryAdapter, PurchaseRepositoryAdapter, UserRepositoryAdapter};
pub use attempt::{AttemptRecord, AttemptStore};
pub use password::PasswordRepository;
pub use purchase::PurchaseRepository;
pub use user::UserRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for user repository access.
pub trait UserRepositoryProvider: Send + Sync + 'static {
    type UserRepo: UserRepository;

    fn user(&self) -> &Self::UserRepo;
}

/// Provider trait for password repository access.
pub trait PasswordRepositoryProvider: Send + Sync + 'static {
    type PasswordRepo: PasswordRepository;

    fn password(&self) -> &Self::PasswordRepo;
}

/// Provider trait for purchase repository access.
pub trait PurchaseRepositoryProvider: Send + Sync + 'static {
    type PurchaseRepo: PurchaseRepository;

    fn purchase(&self) -> &Self::PurchaseRepo;
}

/// Provider trait that storage backends implement to expose all repositories.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each `*Repository` trait for your backend
/// 2. Implement each `*RepositoryProvider` trait
/// 3. Implement this trait with `migrate()` and `health_check()`
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider + PasswordRepositoryProvider + PurchaseRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
