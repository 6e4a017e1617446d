//! Promotion administration.
//!
//! Each promotion detail stores the discount as a percent of its room's
//! price, recomputed from the promotion amount whenever the promotion is
//! written.

use rust_decimal::Decimal;
use tracing::info;

use crate::auth::Principal;
use crate::db::{InventoryStore, PromotionWithDetails};
use crate::error::{AppError, Result};
use crate::models::PromotionInput;
use crate::pricing::services::promotion_percents;

fn validate_promotion(input: &PromotionInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("promotion name is required".to_string()));
    }
    if input.start_date > input.end_date {
        return Err(AppError::Validation(format!(
            "promotion ends ({}) before it starts ({})",
            input.end_date, input.start_date
        )));
    }
    if input.discount_amount < Decimal::ZERO {
        return Err(AppError::Validation(
            "discount amount must not be negative".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_promotion(
    store: &dyn InventoryStore,
    principal: &Principal,
    input: PromotionInput,
) -> Result<PromotionWithDetails> {
    principal.require_admin()?;
    validate_promotion(&input)?;

    let details = promotion_percents(store, input.discount_amount, &input.room_ids).await?;
    let written = store.insert_promotion(&input, details).await?;
    info!(
        promotion_id = written.promotion.id,
        rooms = written.details.len(),
        "Promotion created"
    );
    Ok(written)
}

pub async fn update_promotion(
    store: &dyn InventoryStore,
    principal: &Principal,
    promotion_id: i32,
    input: PromotionInput,
) -> Result<PromotionWithDetails> {
    principal.require_admin()?;
    validate_promotion(&input)?;

    let details = promotion_percents(store, input.discount_amount, &input.room_ids).await?;
    let written = store
        .update_promotion(promotion_id, &input, details)
        .await?
        .ok_or_else(|| AppError::not_found("Promotion", promotion_id))?;
    info!(promotion_id, rooms = written.details.len(), "Promotion updated");
    Ok(written)
}

/// Delete a promotion and its room bindings
pub async fn delete_promotion(
    store: &dyn InventoryStore,
    principal: &Principal,
    promotion_id: i32,
) -> Result<()> {
    principal.require_admin()?;

    if !store.delete_promotion(promotion_id).await? {
        return Err(AppError::not_found("Promotion", promotion_id));
    }
    info!(promotion_id, "Promotion deleted");
    Ok(())
}

pub async fn list_promotions(
    store: &dyn InventoryStore,
    principal: &Principal,
) -> Result<Vec<PromotionWithDetails>> {
    principal.require_admin()?;
    store.list_promotions().await
}
