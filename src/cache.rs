//! In-memory caching using moka
//!
//! Caches the informational attachments of rooms (image paths, service
//! names). Room and service admin writes invalidate the affected entries; a
//! TTL bounds staleness for anything written behind the service's back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, info};

use crate::db::InventoryStore;
use crate::error::Result;
use crate::models::RoomMedia;

/// Application cache holding per-room attachments
#[derive(Clone)]
pub struct AppCache {
    /// Room attachments (room_id -> RoomMedia)
    pub room_media: Cache<i32, Arc<RoomMedia>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Room media: 1000 entries, 15 min TTL, 5 min idle
            room_media: Cache::builder()
                .max_capacity(1000)
                .time_to_live(Duration::from_secs(15 * 60))
                .time_to_idle(Duration::from_secs(5 * 60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            room_media_size: self.room_media.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.room_media.invalidate_all();
        info!("All caches invalidated");
    }

    /// Invalidate the attachments of one room
    pub async fn invalidate_room(&self, room_id: i32) {
        self.room_media.invalidate(&room_id).await;
        debug!(room_id, "Room media cache invalidated");
    }

    /// Attachments for the given rooms, loading misses from the store in one
    /// batch. Every requested room is present in the result.
    pub async fn room_media(
        &self,
        store: &dyn InventoryStore,
        room_ids: &[i32],
    ) -> Result<HashMap<i32, Arc<RoomMedia>>> {
        let mut found = HashMap::with_capacity(room_ids.len());
        let mut misses = Vec::new();

        for &room_id in room_ids {
            if found.contains_key(&room_id) || misses.contains(&room_id) {
                continue;
            }
            match self.room_media.get(&room_id).await {
                Some(media) => {
                    found.insert(room_id, media);
                }
                None => misses.push(room_id),
            }
        }

        if misses.is_empty() {
            return Ok(found);
        }

        let mut images = store.room_images(&misses).await?;
        let mut services = store.room_services(&misses).await?;
        debug!(loaded = misses.len(), "Room media cache miss");

        for room_id in misses {
            let media = Arc::new(RoomMedia {
                image_paths: images.remove(&room_id).unwrap_or_default(),
                services: services.remove(&room_id).unwrap_or_default(),
            });
            self.room_media.insert(room_id, media.clone()).await;
            found.insert(room_id, media);
        }

        Ok(found)
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub room_media_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_room_media_loads_and_caches() {
        let store = MemoryStore::new();
        let room = store.add_room("Suite", "", 55.0, dec!(3000000), 2).await;
        store.add_image(room.id, "rooms/suite.jpg").await;
        store.add_service(room.id, "Spa").await;
        let bare = store.add_room("Bare", "", 10.0, dec!(100), 1).await;

        let cache = AppCache::new();
        let media = cache.room_media(&store, &[room.id, bare.id]).await.unwrap();

        assert_eq!(media[&room.id].image_paths, vec!["rooms/suite.jpg".to_string()]);
        assert_eq!(media[&room.id].services, vec!["Spa".to_string()]);
        assert!(media[&bare.id].image_paths.is_empty());

        // Served from cache even after the store changes
        store.add_image(room.id, "rooms/suite-2.jpg").await;
        let cached = cache.room_media(&store, &[room.id]).await.unwrap();
        assert_eq!(cached[&room.id].image_paths.len(), 1);

        cache.invalidate_room(room.id).await;
        let reloaded = cache.room_media(&store, &[room.id]).await.unwrap();
        assert_eq!(reloaded[&room.id].image_paths.len(), 2);
    }
}
