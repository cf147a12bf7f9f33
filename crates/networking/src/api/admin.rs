//! Admin API operations
//!
//! Every mutation is validated locally first so malformed input never
//! reaches the backend.

use crate::CreditsClient;
use hostcredits_core::{
    ActionResponse, AdjustmentResponse, AdminSettings, CreditAdjustment, Product, ProductDraft,
    ProductUpdate, Result, SettingsUpdate, User,
};
use tracing::info;

pub async fn list_users(client: &CreditsClient) -> Result<Vec<User>> {
    client.admin_users().await
}

pub async fn add_credits(
    client: &CreditsClient,
    adjustment: &CreditAdjustment,
) -> Result<AdjustmentResponse> {
    adjustment.validate()?;
    let response = client.admin_add_credits(adjustment).await?;
    info!(
        "Added {} credits to {} (now {})",
        adjustment.amount, adjustment.user_id, response.new_credits
    );
    Ok(response)
}

pub async fn remove_credits(
    client: &CreditsClient,
    adjustment: &CreditAdjustment,
) -> Result<AdjustmentResponse> {
    adjustment.validate()?;
    let response = client.admin_remove_credits(adjustment).await?;
    info!(
        "Removed {} credits from {} (now {})",
        adjustment.amount, adjustment.user_id, response.new_credits
    );
    Ok(response)
}

pub async fn get_settings(client: &CreditsClient) -> Result<AdminSettings> {
    client.admin_settings().await
}

pub async fn update_settings(
    client: &CreditsClient,
    update: &SettingsUpdate,
) -> Result<ActionResponse> {
    update.validate()?;
    client.admin_update_settings(update).await
}

pub async fn list_products(client: &CreditsClient) -> Result<Vec<Product>> {
    client.admin_products().await
}

pub async fn create_product(client: &CreditsClient, draft: &ProductDraft) -> Result<Product> {
    draft.validate()?;
    client.admin_create_product(draft).await
}

pub async fn update_product(
    client: &CreditsClient,
    id: &str,
    update: &ProductUpdate,
) -> Result<ActionResponse> {
    update.validate()?;
    client.admin_update_product(id, update).await
}

pub async fn delete_product(client: &CreditsClient, id: &str) -> Result<ActionResponse> {
    client.admin_delete_product(id).await
}
