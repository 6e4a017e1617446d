//! Hotel administration.

use std::collections::HashSet;

use tracing::info;

use crate::auth::Principal;
use crate::db::InventoryStore;
use crate::error::{AppError, Result};
use crate::models::{Hotel, HotelDetail, HotelDetailInput, HotelInput};

fn validate_hotel(input: &HotelInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("hotel name is required".to_string()));
    }
    Ok(())
}

pub async fn create_hotel(
    store: &dyn InventoryStore,
    principal: &Principal,
    input: HotelInput,
) -> Result<Hotel> {
    principal.require_admin()?;
    validate_hotel(&input)?;

    let hotel = store.insert_hotel(input).await?;
    info!(hotel_id = hotel.id, name = %hotel.name, "Hotel created");
    Ok(hotel)
}

pub async fn update_hotel(
    store: &dyn InventoryStore,
    principal: &Principal,
    hotel_id: i32,
    input: HotelInput,
) -> Result<Hotel> {
    principal.require_admin()?;
    validate_hotel(&input)?;

    store
        .update_hotel(hotel_id, input)
        .await?
        .ok_or_else(|| AppError::not_found("Hotel", hotel_id))
}

/// Delete a hotel together with its capacity records
pub async fn delete_hotel(
    store: &dyn InventoryStore,
    principal: &Principal,
    hotel_id: i32,
) -> Result<()> {
    principal.require_admin()?;

    if !store.delete_hotel(hotel_id).await? {
        return Err(AppError::not_found("Hotel", hotel_id));
    }
    info!(hotel_id, "Hotel deleted");
    Ok(())
}

/// Replace the full room capacity set of a hotel in one transaction.
///
/// Counts must be non-negative, every room must exist and appear once.
pub async fn replace_hotel_details(
    store: &dyn InventoryStore,
    principal: &Principal,
    hotel_id: i32,
    details: Vec<HotelDetailInput>,
) -> Result<Vec<HotelDetail>> {
    principal.require_admin()?;

    let mut seen = HashSet::new();
    for detail in &details {
        if detail.room_count < 0 {
            return Err(AppError::Validation(format!(
                "room count for room {} must not be negative",
                detail.room_id
            )));
        }
        if !seen.insert(detail.room_id) {
            return Err(AppError::Validation(format!(
                "room {} is listed more than once",
                detail.room_id
            )));
        }
    }

    let written = store.replace_hotel_details(hotel_id, details).await?;
    info!(hotel_id, details = written.len(), "Hotel capacity replaced");
    Ok(written)
}
