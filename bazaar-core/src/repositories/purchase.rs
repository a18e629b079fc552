use crate::{
    Error,
    purchase::{NewPurchase, Purchase, PurchaseId, PurchaseUpdate},
};
use async_trait::async_trait;

/// Repository for purchase records
#[async_trait]
pub trait PurchaseRepository: Send + Sync + 'static {
    async fn create(&self, purchase: NewPurchase) -> Result<Purchase, Error>;

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, Error>;

    /// All purchases, oldest first
    async fn list(&self) -> Result<Vec<Purchase>, Error>;

    /// Update price and quantity, returning the stored record or `None` if it does not exist
    async fn update(
        &self,
        id: &PurchaseId,
        update: PurchaseUpdate,
    ) -> Result<Option<Purchase>, Error>;

    async fn delete(&self, id: &PurchaseId) -> Result<(), Error>;
}
