use crate::{
    Error, User, UserId,
    error::{AuthError, StorageError, utilities::FoundExt},
    pagination::{Page, UserListQuery},
    repositories::{PasswordRepository, UserRepository},
    services::PasswordService,
    user::{NewUser, UserSummary},
    validation::{validate_email, validate_name, validate_password},
};
use std::sync::Arc;

/// Service for user management operations
pub struct UserService<U: UserRepository, P: PasswordRepository> {
    repository: Arc<U>,
    password_service: Arc<PasswordService<U, P>>,
}

impl<U: UserRepository, P: PasswordRepository> UserService<U, P> {
    /// Create a new UserService with the given repository
    pub fn new(repository: Arc<U>, password_service: Arc<PasswordService<U, P>>) -> Self {
        Self {
            repository,
            password_service,
        }
    }

    /// List users one page at a time
    pub async fn list_users(&self, query: &UserListQuery) -> Result<Page<UserSummary>, Error> {
        let params = query.parse()?;

        let total = self.repository.count(params.search.as_ref()).await?;
        let users = self.repository.list(&params).await?;

        Ok(Page::new(&params, total, users).map(UserSummary::from))
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.repository.find_by_id(user_id).await?.or_not_found()
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.repository.find_by_email(email).await
    }

    /// Create a user with a password
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, Error> {
        let name = name.trim();
        let email = email.trim();
        validate_name(name)?;
        validate_email(email)?;
        validate_password(password)?;

        if password != password_confirm {
            return Err(AuthError::PasswordMismatch.into());
        }

        if self.repository.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyTaken.into());
        }

        let new_user = NewUser::builder()
            .id(UserId::new_random())
            .name(name.to_string())
            .email(email.to_string())
            .build()?;

        let user = self
            .repository
            .create(new_user)
            .await
            .map_err(email_conflict)?;

        if let Err(e) = self.password_service.set_password(&user.id, password).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to store password for new user");
            self.repository.delete(&user.id).await?;
            return Err(e);
        }

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Update name and email of a user
    pub async fn update_user(&self, user_id: &UserId, name: &str, email: &str) -> Result<User, Error> {
        let name = name.trim();
        let email = email.trim();
        validate_name(name)?;
        validate_email(email)?;

        let mut user = self.get_user(user_id).await?;

        let owner = self.repository.find_by_email(email).await?;
        if owner.is_some_and(|owner| owner.id != user.id) {
            return Err(AuthError::EmailAlreadyTaken.into());
        }

        user.name = name.to_string();
        user.email = email.to_string();

        self.repository.update(&user).await.map_err(email_conflict)
    }

    /// Delete a user and their password
    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), Error> {
        let user = self.get_user(user_id).await?;

        self.password_service.remove_password(&user.id).await?;
        self.repository.delete(&user.id).await?;

        tracing::info!(user_id = %user.id, "User deleted");
        Ok(())
    }
}

/// A unique constraint hit between the email check and the write
fn email_conflict(error: Error) -> Error {
    match error {
        Error::Storage(StorageError::Constraint(_)) => AuthError::EmailAlreadyTaken.into(),
        other => other,
    }
}
