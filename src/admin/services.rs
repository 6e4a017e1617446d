//! Service administration. A service is bound to a set of rooms; writing a
//! service replaces that set.

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::auth::Principal;
use crate::cache::AppCache;
use crate::db::InventoryStore;
use crate::error::{AppError, Result};
use crate::models::{ServiceInput, ServiceWithRooms};

fn validate_service(input: &ServiceInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("service name is required".to_string()));
    }
    if input.price < Decimal::ZERO {
        return Err(AppError::Validation(
            "service price must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Known rooms of `room_ids`, first occurrence order
async fn known_rooms(store: &dyn InventoryStore, room_ids: &[i32]) -> Result<Vec<i32>> {
    let rooms = store.get_rooms(room_ids).await?;
    let mut known = Vec::with_capacity(room_ids.len());
    for room_id in room_ids {
        if known.contains(room_id) {
            continue;
        }
        if rooms.contains_key(room_id) {
            known.push(*room_id);
        } else {
            debug!(room_id, "Skipping unknown room for service");
        }
    }
    Ok(known)
}

pub async fn list_services(
    store: &dyn InventoryStore,
    principal: &Principal,
) -> Result<Vec<ServiceWithRooms>> {
    principal.require_admin()?;
    store.list_services().await
}

pub async fn create_service(
    store: &dyn InventoryStore,
    cache: &AppCache,
    principal: &Principal,
    input: ServiceInput,
) -> Result<ServiceWithRooms> {
    principal.require_admin()?;
    validate_service(&input)?;

    let room_ids = known_rooms(store, &input.room_ids).await?;
    let written = store.insert_service(&input, &room_ids).await?;
    cache.invalidate_all();
    info!(
        service_id = written.service.id,
        rooms = written.room_ids.len(),
        "Service created"
    );
    Ok(written)
}

pub async fn update_service(
    store: &dyn InventoryStore,
    cache: &AppCache,
    principal: &Principal,
    service_id: i32,
    input: ServiceInput,
) -> Result<ServiceWithRooms> {
    principal.require_admin()?;
    validate_service(&input)?;

    let room_ids = known_rooms(store, &input.room_ids).await?;
    let written = store
        .update_service(service_id, &input, &room_ids)
        .await?
        .ok_or_else(|| AppError::not_found("Service", service_id))?;
    cache.invalidate_all();
    info!(service_id, rooms = written.room_ids.len(), "Service updated");
    Ok(written)
}

pub async fn delete_service(
    store: &dyn InventoryStore,
    cache: &AppCache,
    principal: &Principal,
    service_id: i32,
) -> Result<()> {
    principal.require_admin()?;

    if !store.delete_service(service_id).await? {
        return Err(AppError::not_found("Service", service_id));
    }
    cache.invalidate_all();
    info!(service_id, "Service deleted");
    Ok(())
}
