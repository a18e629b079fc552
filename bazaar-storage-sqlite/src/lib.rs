//! SQLite storage backend for bazaar
//!
//! [`SqliteRepositoryProvider`] implements every repository trait from
//! `bazaar_core::repositories` on top of a single [`sqlx::SqlitePool`].
//! Timestamps are stored as unix seconds.
//!
//! ```rust,ignore
//! let provider = SqliteRepositoryProvider::connect("sqlite::memory:").await?;
//! provider.migrate().await?;
//! ```
pub mod migrations;
pub mod repositories;

pub use repositories::{
    SqlitePasswordRepository, SqlitePurchaseRepository, SqliteRepositoryProvider,
    SqliteUserRepository,
};

use bazaar_core::{Error, error::StorageError};
use chrono::{DateTime, Utc};

/// Map a sqlx error, turning unique violations into `StorageError::Constraint`
pub(crate) fn map_sqlx_err(error: sqlx::Error) -> Error {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Storage(StorageError::Constraint(db.message().to_string()))
        }
        _ => Error::Storage(StorageError::Database(error.to_string())),
    }
}

pub(crate) fn from_timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}
