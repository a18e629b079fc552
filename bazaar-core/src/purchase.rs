//! Purchase records
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{generate_prefixed_id, validate_prefixed_id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct PurchaseId(String);

impl PurchaseId {
    pub fn new(id: &str) -> Self {
        PurchaseId(id.to_string())
    }

    pub fn new_random() -> Self {
        PurchaseId(generate_prefixed_id("pur"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "pur")
    }
}

impl Default for PurchaseId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for PurchaseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PurchaseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub product: String,
    pub description: String,
    pub price: f64,
    pub quantity: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchase that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    pub id: PurchaseId,
    pub product: String,
    pub description: String,
    pub price: f64,
    pub quantity: f64,
}

impl NewPurchase {
    pub fn new(product: String, description: String, price: f64, quantity: f64) -> Self {
        Self {
            id: PurchaseId::new_random(),
            product,
            description,
            price,
            quantity,
        }
    }
}

/// The mutable part of a purchase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseUpdate {
    pub price: f64,
    pub quantity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_purchase_gets_prefixed_id() {
        let purchase = NewPurchase::new("Tea".to_string(), "Green tea".to_string(), 3.5, 2.0);
        assert!(purchase.id.is_valid());
        assert!(purchase.id.as_str().starts_with("pur_"));
    }
}
