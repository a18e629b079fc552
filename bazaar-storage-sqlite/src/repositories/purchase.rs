use async_trait::async_trait;
use bazaar_core::{
    Error,
    error::utilities::DatabaseResultExt,
    purchase::{NewPurchase, Purchase, PurchaseId, PurchaseUpdate},
    repositories::PurchaseRepository,
};
use sqlx::SqlitePool;

use crate::{from_timestamp, map_sqlx_err};

pub struct SqlitePurchaseRepository {
    pool: SqlitePool,
}

impl SqlitePurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqlitePurchase {
    id: String,
    product: String,
    description: String,
    price: f64,
    quantity: f64,
    created_at: i64,
    updated_at: i64,
}

impl From<SqlitePurchase> for Purchase {
    fn from(purchase: SqlitePurchase) -> Self {
        Purchase {
            id: PurchaseId::from(purchase.id),
            product: purchase.product,
            description: purchase.description,
            price: purchase.price,
            quantity: purchase.quantity,
            created_at: from_timestamp(purchase.created_at),
            updated_at: from_timestamp(purchase.updated_at),
        }
    }
}

#[async_trait]
impl PurchaseRepository for SqlitePurchaseRepository {
    async fn create(&self, purchase: NewPurchase) -> Result<Purchase, Error> {
        let now = chrono::Utc::now().timestamp();

        let stored = sqlx::query_as::<_, SqlitePurchase>(
            r#"
            INSERT INTO purchases (id, product, description, price, quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING *
            "#,
        )
        .bind(purchase.id.as_str())
        .bind(&purchase.product)
        .bind(&purchase.description)
        .bind(purchase.price)
        .bind(purchase.quantity)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(stored.into())
    }

    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, Error> {
        let stored = sqlx::query_as::<_, SqlitePurchase>("SELECT * FROM purchases WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_db_err()?;

        Ok(stored.map(Purchase::from))
    }

    async fn list(&self) -> Result<Vec<Purchase>, Error> {
        // rowid breaks ties between purchases created in the same second
        let stored = sqlx::query_as::<_, SqlitePurchase>(
            "SELECT * FROM purchases ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_db_err()?;

        Ok(stored.into_iter().map(Purchase::from).collect())
    }

    async fn update(
        &self,
        id: &PurchaseId,
        update: PurchaseUpdate,
    ) -> Result<Option<Purchase>, Error> {
        let now = chrono::Utc::now().timestamp();

        let stored = sqlx::query_as::<_, SqlitePurchase>(
            r#"
            UPDATE purchases
            SET price = ?2, quantity = ?3, updated_at = ?4
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .bind(update.price)
        .bind(update.quantity)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(stored.map(Purchase::from))
    }

    async fn delete(&self, id: &PurchaseId) -> Result<(), Error> {
        sqlx::query("DELETE FROM purchases WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(())
    }
}
