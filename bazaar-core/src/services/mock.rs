//! In-memory repositories shared by the service tests.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    Error, User, UserId,
    error::StorageError,
    pagination::{SortOrder, UserField, UserListParams, UserSearch},
    purchase::{NewPurchase, Purchase, PurchaseId, PurchaseUpdate},
    repositories::{PasswordRepository, PurchaseRepository, UserRepository},
    user::NewUser,
};

#[derive(Default)]
pub struct MockUserRepository {
    users: Mutex<HashMap<UserId, User>>,
    fail_next: AtomicBool,
}

impl MockUserRepository {
    /// Make the next call return a database error
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), Error> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Database("simulated failure".to_string()).into());
        }
        Ok(())
    }

    fn matching<'a>(users: &'a HashMap<UserId, User>, search: Option<&UserSearch>) -> Vec<&'a User> {
        users
            .values()
            .filter(|u| search.is_none_or(|s| s.matches(&u.name, &u.email)))
            .collect()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.check_failure()?;
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StorageError::Constraint("users.email".to_string()).into());
        }

        let user = User::builder()
            .id(user.id)
            .name(user.name)
            .email(user.email)
            .build()?;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.check_failure()?;
        Ok(self.users.lock().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.check_failure()?;
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self, params: &UserListParams) -> Result<Vec<User>, Error> {
        self.check_failure()?;
        let users = self.users.lock().await;
        let mut matching = Self::matching(&users, params.search.as_ref());

        matching.sort_by(|a, b| {
            let ordering = match params.sort.field {
                UserField::Name => a.name.cmp(&b.name),
                UserField::Email => a.email.cmp(&b.email),
            };
            match params.sort.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        Ok(matching
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.limit() as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, search: Option<&UserSearch>) -> Result<u64, Error> {
        self.check_failure()?;
        let users = self.users.lock().await;
        Ok(Self::matching(&users, search).len() as u64)
    }

    async fn update(&self, user: &User) -> Result<User, Error> {
        self.check_failure()?;
        let mut users = self.users.lock().await;
        let stored = users.get_mut(&user.id).ok_or(StorageError::NotFound)?;
        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        self.check_failure()?;
        self.users.lock().await.remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockPasswordRepository {
    hashes: Mutex<HashMap<UserId, String>>,
}

impl MockPasswordRepository {
    pub async fn has_hash(&self, user_id: &UserId) -> bool {
        self.hashes.lock().await.contains_key(user_id)
    }
}

#[async_trait]
impl PasswordRepository for MockPasswordRepository {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.hashes
            .lock()
            .await
            .insert(user_id.clone(), hash.to_string());
        Ok(())
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        Ok(self.hashes.lock().await.get(user_id).cloned())
    }

    async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error> {
        self.hashes.lock().await.remove(user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockPurchaseRepository {
    purchases: Mutex<Vec<Purchase>>,
}

#[async_trait]
impl PurchaseRepository for MockPurchaseRepository {
    async fn create(&self, purchase: NewPurchase) -> Result<Purchase, Error> {
        let now = Utc::now();
        let purchase = Purchase {
            id: purchase.id,
            product: purchase.product,
            description: purchase.description,
            price: purchase.price,
            quantity: purchase.quantity,
            created_at: now,
            updated_at: now,
        };
        self.purchases.lock().await.push(purchase.clone());
        Ok(purchase)
    }

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, Error> {
        Ok(self
            .purchases
            .lock()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Purchase>, Error> {
        Ok(self.purchases.lock().await.clone())
    }

    async fn update(
        &self,
        id: &PurchaseId,
        update: PurchaseUpdate,
    ) -> Result<Option<Purchase>, Error> {
        let mut purchases = self.purchases.lock().await;
        Ok(purchases.iter_mut().find(|p| &p.id == id).map(|p| {
            p.price = update.price;
            p.quantity = update.quantity;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn delete(&self, id: &PurchaseId) -> Result<(), Error> {
        self.purchases.lock().await.retain(|p| &p.id != id);
        Ok(())
    }
}

pub async fn seed_user(users: &MockUserRepository, name: &str, email: &str) -> User {
    let new_user = NewUser::builder()
        .name(name.to_string())
        .email(email.to_string())
        .build()
        .unwrap();
    users.create(new_user).await.unwrap()
}
