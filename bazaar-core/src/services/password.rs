use crate::{
    Error, User, UserId,
    error::CryptoError,
    repositories::{PasswordRepository, UserRepository},
    services::login_guard::CredentialVerifier,
    validation::validate_password,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Service for password hashing and verification
pub struct PasswordService<U: UserRepository, P: PasswordRepository> {
    user_repository: Arc<U>,
    password_repository: Arc<P>,
}

impl<U: UserRepository, P: PasswordRepository> PasswordService<U, P> {
    /// Create a new PasswordService with the given repositories
    pub fn new(user_repository: Arc<U>, password_repository: Arc<P>) -> Self {
        Self {
            user_repository,
            password_repository,
        }
    }

    /// Check an email and password pair
    ///
    /// Returns `Ok(None)` for an unknown email, a user without a stored hash,
    /// or a wrong password. Callers cannot tell these cases apart.
    pub async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, Error> {
        let Some(user) = self.user_repository.find_by_email(email).await? else {
            return Ok(None);
        };

        if self.check_password(&user.id, password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Whether `password` matches the stored hash for `user_id`
    pub async fn check_password(&self, user_id: &UserId, password: &str) -> Result<bool, Error> {
        match self.password_repository.get_password_hash(user_id).await? {
            Some(hash) => Self::verify_password(password, hash).await,
            None => Ok(false),
        }
    }

    /// Validate, hash and store a password for a user
    pub async fn set_password(&self, user_id: &UserId, password: &str) -> Result<(), Error> {
        validate_password(password)?;

        let password_hash = Self::hash_password(password).await?;
        self.password_repository
            .set_password_hash(user_id, &password_hash)
            .await
    }

    /// Remove a user's password
    pub async fn remove_password(&self, user_id: &UserId) -> Result<(), Error> {
        self.password_repository.remove_password_hash(user_id).await
    }

    /// Hash a password using argon2 on the blocking pool
    async fn hash_password(password: &str) -> Result<String, Error> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || password_auth::generate_hash(password))
            .await
            .map_err(|e| CryptoError::PasswordHash(e.to_string()).into())
    }

    /// Verify a password against a hash on the blocking pool
    async fn verify_password(password: &str, hash: String) -> Result<bool, Error> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || password_auth::verify_password(password, &hash).is_ok())
            .await
            .map_err(|e| CryptoError::PasswordHash(e.to_string()).into())
    }
}

#[async_trait]
impl<U: UserRepository, P: PasswordRepository> CredentialVerifier for PasswordService<U, P> {
    type Principal = User;

    async fn verify(&self, identity: &str, secret: &str) -> Result<Option<User>, Error> {
        PasswordService::verify(self, identity, secret).await
    }
}
