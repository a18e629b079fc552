use crate::{
    Error,
    error::{StorageError, utilities::FoundExt},
    purchase::{NewPurchase, Purchase, PurchaseId, PurchaseUpdate},
    repositories::PurchaseRepository,
    validation::{validate_amount, validate_required_text},
};
use std::sync::Arc;

/// Service for purchase records
pub struct PurchaseService<R: PurchaseRepository> {
    repository: Arc<R>,
}

impl<R: PurchaseRepository> PurchaseService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub async fn create_purchase(
        &self,
        product: &str,
        description: &str,
        price: f64,
        quantity: f64,
    ) -> Result<Purchase, Error> {
        validate_required_text("Product", product)?;
        validate_required_text("Description", description)?;
        validate_amount("Price", price)?;
        validate_amount("Quantity", quantity)?;

        let purchase = NewPurchase::new(
            product.trim().to_string(),
            description.trim().to_string(),
            price,
            quantity,
        );
        self.repository.create(purchase).await
    }

    /// All purchases, oldest first
    pub async fn list_purchases(&self) -> Result<Vec<Purchase>, Error> {
        self.repository.list().await
    }

    pub async fn get_purchase(&self, id: &PurchaseId) -> Result<Purchase, Error> {
        self.repository.find_by_id(id).await?.or_not_found()
    }

    /// Change price and quantity of a purchase
    pub async fn update_purchase(
        &self,
        id: &PurchaseId,
        price: f64,
        quantity: f64,
    ) -> Result<Purchase, Error> {
        validate_amount("Price", price)?;
        validate_amount("Quantity", quantity)?;

        self.repository
            .update(id, PurchaseUpdate { price, quantity })
            .await?
            .or_not_found()
    }

    pub async fn delete_purchase(&self, id: &PurchaseId) -> Result<(), Error> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(StorageError::NotFound.into());
        }
        self.repository.delete(id).await
    }
}
