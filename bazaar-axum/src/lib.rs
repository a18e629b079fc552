//! # Bazaar Axum Integration
//!
//! HTTP routes for the Bazaar backend: login, user management and purchases.
//! Every error is rendered as `{"error": <message>, "code": <status>}`; a
//! locked-out login answers `403 Forbidden` with a `Retry-After` header.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bazaar::BazaarBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bazaar = BazaarBuilder::new()
//!         .with_sqlite("sqlite://bazaar.db?mode=rwc")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let app = bazaar_axum::routes(Arc::new(bazaar));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod extractors;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::{ApiJson, ApiQuery};
pub use routes::{AppState, create_router};
pub use types::*;

use std::sync::Arc;

use axum::Router;
use bazaar::{Bazaar, RepositoryProvider};

/// Build the full Bazaar router
pub fn routes<R>(bazaar: Arc<Bazaar<R>>) -> Router
where
    R: RepositoryProvider + 'static,
{
    create_router(bazaar)
}
