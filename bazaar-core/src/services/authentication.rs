use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Error, User, UserId,
    error::{AuthError, ValidationError},
    repositories::{AttemptStore, PasswordRepository, UserRepository},
    services::{LoginGuard, PasswordService},
};

/// Payload returned for a successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
}

impl From<User> for LoginResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Email and password login behind the login guard
pub struct AuthenticationService<U, P, S>
where
    U: UserRepository,
    P: PasswordRepository,
    S: AttemptStore,
{
    guard: Arc<LoginGuard<S>>,
    password_service: Arc<PasswordService<U, P>>,
}

impl<U, P, S> AuthenticationService<U, P, S>
where
    U: UserRepository,
    P: PasswordRepository,
    S: AttemptStore,
{
    pub fn new(guard: Arc<LoginGuard<S>>, password_service: Arc<PasswordService<U, P>>) -> Self {
        Self {
            guard,
            password_service,
        }
    }

    pub fn guard(&self) -> &Arc<LoginGuard<S>> {
        &self.guard
    }

    /// Log in with email and password
    ///
    /// The trimmed email is the throttling identity. Malformed requests are
    /// rejected before the guard and do not count as failed attempts.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, Error> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingField("Email is required".to_string()).into());
        }
        if password.is_empty() {
            return Err(ValidationError::MissingField("Password is required".to_string()).into());
        }

        let user = self
            .guard
            .attempt_login_with(self.password_service.as_ref(), email, password)
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user.into())
    }

    /// Replace a user's password after checking the current one
    ///
    /// The current password is checked behind the guard with the user's email
    /// as identity, so wrong guesses count toward the same lockout as failed
    /// logins and a locked email is refused before any hash is checked.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TooManyAttempts`] while the email is locked out
    /// - [`AuthError::InvalidPassword`] when `old_password` is wrong
    /// - [`AuthError::PasswordMismatch`] when the confirmation differs
    pub async fn change_password(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
        new_password_confirm: &str,
    ) -> Result<(), Error> {
        let password_service = self.password_service.as_ref();
        self.guard
            .attempt_login(&user.email, || async move {
                let matches = password_service
                    .check_password(&user.id, old_password)
                    .await?;
                Ok::<_, Error>(matches.then_some(()))
            })
            .await
            .map_err(|e| match e {
                Error::Auth(AuthError::InvalidCredentials) => AuthError::InvalidPassword.into(),
                other => other,
            })?;

        if new_password != new_password_confirm {
            return Err(AuthError::PasswordMismatch.into());
        }

        self.password_service
            .set_password(&user.id, new_password)
            .await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }
}
