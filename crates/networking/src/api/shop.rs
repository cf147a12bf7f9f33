//! Shop API operations

use crate::CreditsClient;
use hostcredits_core::{Error, Product, PurchaseResponse, Result};

/// List products, cheapest first
pub async fn list_products(client: &CreditsClient) -> Result<Vec<Product>> {
    let mut products = client.list_products().await?;
    products.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
    Ok(products)
}

/// Purchase a product
///
/// When the cached listing already shows the product sold out the request
/// is not sent. Balance checks are left to the backend.
pub async fn purchase(client: &CreditsClient, product_id: &str) -> Result<PurchaseResponse> {
    if product_id.trim().is_empty() {
        return Err(Error::Validation("product id must not be empty".into()));
    }
    if let Some(product) = client.cache().and_then(|c| c.get_product(product_id)) {
        if !product.in_stock() {
            return Err(Error::Validation(format!("{} is out of stock", product.name)));
        }
    }
    client.purchase(product_id).await
}
