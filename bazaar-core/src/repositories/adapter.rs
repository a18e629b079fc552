use crate::{
    Error, User, UserId,
    pagination::{UserListParams, UserSearch},
    purchase::{NewPurchase, Purchase, PurchaseId, PurchaseUpdate},
    repositories::{PasswordRepository, PurchaseRepository, RepositoryProvider, UserRepository},
    user::NewUser,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Adapter that wraps a RepositoryProvider and implements UserRepository
pub struct UserRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> UserRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.provider.user().create(user).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.user().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.provider.user().find_by_email(email).await
    }

    async fn list(&self, params: &UserListParams) -> Result<Vec<User>, Error> {
        self.provider.user().list(params).await
    }

    async fn count(&self, search: Option<&UserSearch>) -> Result<u64, Error> {
        self.provider.user().count(search).await
    }

    async fn update(&self, user: &User) -> Result<User, Error> {
        self.provider.user().update(user).await
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        self.provider.user().delete(id).await
    }
}

pub struct PasswordRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> PasswordRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> PasswordRepository for PasswordRepositoryAdapter<R> {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.provider
            .password()
            .set_password_hash(user_id, hash)
            .await
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        self.provider.password().get_password_hash(user_id).await
    }

    async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.password().remove_password_hash(user_id).await
    }
}

pub struct PurchaseRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> PurchaseRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> PurchaseRepository for PurchaseRepositoryAdapter<R> {
    async fn create(&self, purchase: NewPurchase) -> Result<Purchase, Error> {
        self.provider.purchase().create(purchase).await
    }

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, Error> {
        self.provider.purchase().find_by_id(id).await
    }

    async fn list(&self) -> Result<Vec<Purchase>, Error> {
        self.provider.purchase().list().await
    }

    async fn update(
        &self,
        id: &PurchaseId,
        update: PurchaseUpdate,
    ) -> Result<Option<Purchase>, Error> {
        self.provider.purchase().update(id, update).await
    }

    async fn delete(&self, id: &PurchaseId) -> Result<(), Error> {
        self.provider.purchase().delete(id).await
    }
}
