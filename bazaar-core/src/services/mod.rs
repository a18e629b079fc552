//! Service layer for business logic
//!
//! Services hold `Arc`s to repositories and never touch storage directly.

pub mod authentication;
pub mod login_guard;
pub mod password;
pub mod purchase;
pub mod user;

#[cfg(test)]
pub(crate) mod mock;

pub use authentication::{AuthenticationService, LoginResponse};
pub use login_guard::{CredentialVerifier, LockoutStatus, LoginGuard, LoginGuardConfig};
pub use password::PasswordService;
pub use purchase::PurchaseService;
pub use user::UserService;
