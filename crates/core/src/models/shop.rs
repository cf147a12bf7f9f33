//! Shop catalog and purchase models

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A hosting product as listed by `/shop/products` and `/admin/products`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price in credits
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn affordable_with(&self, balance: i64) -> bool {
        balance >= self.price
    }
}

/// Body of `POST /admin/products`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i64,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("product name must not be empty".into()));
        }
        if self.price <= 0 {
            return Err(Error::Validation(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        if self.stock < 0 {
            return Err(Error::Validation(format!(
                "stock must not be negative, got {}",
                self.stock
            )));
        }
        Ok(())
    }
}

/// Body of `PUT /admin/products/{id}`; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
        {
            return Err(Error::Validation("nothing to update".into()));
        }
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(Error::Validation("product name must not be empty".into()));
        }
        if matches!(self.price, Some(p) if p <= 0) {
            return Err(Error::Validation("price must be positive".into()));
        }
        if matches!(self.stock, Some(s) if s < 0) {
            return Err(Error::Validation("stock must not be negative".into()));
        }
        Ok(())
    }
}

/// Response from `POST /shop/purchase/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    /// Authoritative balance after the purchase
    pub remaining_credits: i64,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Response from `POST /admin/products`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreatedResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub product: Product,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "VPS S".into(),
            description: "1 vCPU".into(),
            price: 50,
            stock: 10,
        }
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft().validate().is_ok());
        assert!(ProductDraft { name: " ".into(), ..draft() }.validate().is_err());
        assert!(ProductDraft { price: 0, ..draft() }.validate().is_err());
        assert!(ProductDraft { stock: -1, ..draft() }.validate().is_err());
    }

    #[test]
    fn test_update_validation() {
        assert!(ProductUpdate::default().validate().is_err());
        let ok = ProductUpdate {
            stock: Some(0),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
        assert_eq!(serde_json::to_value(&ok).unwrap(), serde_json::json!({"stock": 0}));
    }

    #[test]
    fn test_product_helpers() {
        let p: Product = serde_json::from_str(
            r#"{"id":"p1","name":"VPS","description":"","price":20,"stock":0}"#,
        )
        .unwrap();
        assert!(!p.in_stock());
        assert!(p.affordable_with(20));
        assert!(!p.affordable_with(19));
    }
}
