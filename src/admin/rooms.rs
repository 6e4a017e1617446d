//! Room type administration.
//!
//! Writes drop the room's cached media so the next search sees the new
//! images.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::auth::Principal;
use crate::cache::AppCache;
use crate::db::InventoryStore;
use crate::error::{AppError, Result};
use crate::models::{Room, RoomInput, RoomMedia};

/// A room type with its images and services
#[derive(Debug, Clone, Serialize)]
pub struct RoomView {
    #[serde(flatten)]
    pub room: Room,
    #[serde(flatten)]
    pub media: RoomMedia,
}

fn validate_room(input: &RoomInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("room name is required".to_string()));
    }
    if input.price < Decimal::ZERO {
        return Err(AppError::Validation("room price must not be negative".to_string()));
    }
    if !input.size.is_finite() || input.size < 0.0 {
        return Err(AppError::Validation("room size must not be negative".to_string()));
    }
    if input.bed_count < 1 {
        return Err(AppError::Validation("a room has at least one bed".to_string()));
    }
    Ok(())
}

async fn view(store: &dyn InventoryStore, cache: &AppCache, room: Room) -> Result<RoomView> {
    let media = cache.room_media(store, &[room.id]).await?;
    let media = media
        .get(&room.id)
        .map(|m| RoomMedia::clone(m))
        .unwrap_or_default();
    Ok(RoomView { room, media })
}

/// Every room type with its media, in id order
pub async fn list_rooms(store: &dyn InventoryStore, cache: &AppCache) -> Result<Vec<RoomView>> {
    let rooms = store.list_rooms().await?;
    let ids: Vec<i32> = rooms.iter().map(|r| r.id).collect();
    let media = cache.room_media(store, &ids).await?;

    Ok(rooms
        .into_iter()
        .map(|room| {
            let media = media
                .get(&room.id)
                .map(|m| RoomMedia::clone(m))
                .unwrap_or_default();
            RoomView { room, media }
        })
        .collect())
}

pub async fn create_room(
    store: &dyn InventoryStore,
    cache: &AppCache,
    principal: &Principal,
    input: RoomInput,
) -> Result<RoomView> {
    principal.require_admin()?;
    validate_room(&input)?;

    let room = store.insert_room(&input).await?;
    info!(room_id = room.id, name = %room.name, "Room created");
    view(store, cache, room).await
}

/// Update a room type. Listed image paths are attached, removals dropped.
pub async fn update_room(
    store: &dyn InventoryStore,
    cache: &AppCache,
    principal: &Principal,
    room_id: i32,
    input: RoomInput,
) -> Result<RoomView> {
    principal.require_admin()?;
    validate_room(&input)?;

    let room = store
        .update_room(room_id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Room", room_id))?;
    cache.invalidate_room(room_id).await;
    info!(
        room_id,
        added = input.image_paths.len(),
        removed = input.remove_image_paths.len(),
        "Room updated"
    );
    view(store, cache, room).await
}

/// Delete a room type that no booking references
pub async fn delete_room(
    store: &dyn InventoryStore,
    cache: &AppCache,
    principal: &Principal,
    room_id: i32,
) -> Result<()> {
    principal.require_admin()?;

    if !store.delete_room(room_id).await? {
        return Err(AppError::not_found("Room", room_id));
    }
    cache.invalidate_room(room_id).await;
    info!(room_id, "Room deleted");
    Ok(())
}
