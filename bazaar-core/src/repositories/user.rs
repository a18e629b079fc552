use crate::{
    Error, User, UserId,
    pagination::{UserListParams, UserSearch},
    user::NewUser,
};
use async_trait::async_trait;

/// Repository for user data access
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Create a new user
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Fetch one page of users, sorted and filtered per `params`
    async fn list(&self, params: &UserListParams) -> Result<Vec<User>, Error>;

    /// Count users matching an optional search filter
    async fn count(&self, search: Option<&UserSearch>) -> Result<u64, Error>;

    /// Update name and email of an existing user
    async fn update(&self, user: &User) -> Result<User, Error>;

    /// Delete a user by ID
    async fn delete(&self, id: &UserId) -> Result<(), Error>;
}
