//! Core functionality for the bazaar backend
//!
//! This crate holds the domain types, the repository traits that storage
//! backends implement, and the services built on top of them. The most
//! involved piece is the [`LoginGuard`], which throttles repeated failed
//! logins per identity; see [`services::login_guard`].
//!
//! Storage backends depend on this crate and implement
//! [`repositories::RepositoryProvider`]. Application code normally goes
//! through the `bazaar` facade instead of wiring services by hand.
pub mod attempt_store;
pub mod clock;
pub mod error;
pub mod id;
pub mod pagination;
pub mod purchase;
pub mod repositories;
pub mod services;
pub mod user;
pub mod validation;

pub use attempt_store::{AttemptStoreConfig, InMemoryAttemptStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;
pub use pagination::{Page, UserListQuery};
pub use purchase::{Purchase, PurchaseId};
pub use services::{LockoutStatus, LoginGuard, LoginGuardConfig, LoginResponse};
pub use user::{User, UserId, UserSummary};
