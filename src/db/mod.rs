//! Inventory store: the data access seam of the booking core.
//!
//! `PgStore` is the production backend. `MemoryStore` keeps the same tables in
//! process and backs tests and the demo `memory` storage mode.

pub mod memory;
pub mod postgres;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::config::{Config, StorageKind};
use crate::error::{AppError, Result};
use crate::models::{
    ActivePromotion, Booking, BookingStatus, CandidateRow, CapacityEffect, GuestContact, Hotel,
    HotelDetail, HotelDetailInput, HotelInput, NewBooking, NewRoomDetail, Promotion,
    PromotionDetail, PromotionInput, ReportLine, Room, RoomDetail, RoomFilters, RoomInput,
    ServiceInput, ServiceWithRooms, StayRange,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A promotion with its room bindings
#[derive(Debug, Clone, serde::Serialize)]
pub struct PromotionWithDetails {
    #[serde(flatten)]
    pub promotion: Promotion,
    pub details: Vec<PromotionDetail>,
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    // ---- catalog ----

    /// Hotel details joined with hotel and room, filtered by the non-date predicates
    async fn find_candidates(&self, filters: &RoomFilters) -> Result<Vec<CandidateRow>>;

    /// Sum of booked quantities per hotel detail over non-cancelled bookings
    /// overlapping `stay`. Hotel details with nothing booked are absent.
    async fn booked_quantities(
        &self,
        hotel_detail_ids: &[i32],
        stay: &StayRange,
    ) -> Result<HashMap<i32, i64>>;

    async fn get_rooms(&self, room_ids: &[i32]) -> Result<HashMap<i32, Room>>;

    async fn room_images(&self, room_ids: &[i32]) -> Result<HashMap<i32, Vec<String>>>;

    /// Distinct service names per room
    async fn room_services(&self, room_ids: &[i32]) -> Result<HashMap<i32, Vec<String>>>;

    /// Every promotion detail of the given rooms whose promotion runs on `as_of`
    async fn active_promotions(
        &self,
        room_ids: &[i32],
        as_of: NaiveDate,
    ) -> Result<Vec<ActivePromotion>>;

    async fn get_hotel_details(&self, ids: &[i32]) -> Result<HashMap<i32, HotelDetail>>;

    async fn get_hotels(&self, ids: &[i32]) -> Result<HashMap<i32, Hotel>>;

    // ---- bookings ----

    /// Insert a booking and its line items atomically.
    ///
    /// Each hotel detail the lines draw on is locked and re-counted inside the
    /// insert: if overlapping non-cancelled bookings plus the new lines exceed
    /// its `room_count`, nothing is written and `Conflict` is returned.
    async fn insert_booking(&self, booking: NewBooking, lines: Vec<NewRoomDetail>)
        -> Result<Booking>;

    async fn get_booking(&self, id: i32) -> Result<Option<Booking>>;

    async fn room_details(&self, booking_id: i32) -> Result<Vec<RoomDetail>>;

    /// A user's bookings, newest first
    async fn bookings_for_user(&self, user_id: i32) -> Result<Vec<Booking>>;

    async fn update_contact(&self, booking_id: i32, contact: &GuestContact) -> Result<()>;

    /// Compare-and-set the booking status from `from` to `to` and apply
    /// `effect` to every line of the booking, in one transaction. Each line
    /// records the units it consumed so a release returns exactly those. Returns false (and writes nothing) when the stored status
    /// is no longer `from`.
    async fn transition_status(
        &self,
        booking_id: i32,
        from: BookingStatus,
        to: BookingStatus,
        effect: CapacityEffect,
    ) -> Result<bool>;

    /// Delete a booking and its line items. Returns false if it did not exist.
    async fn delete_booking(&self, id: i32) -> Result<bool>;

    // ---- hotels ----

    async fn insert_hotel(&self, hotel: HotelInput) -> Result<Hotel>;

    async fn update_hotel(&self, id: i32, hotel: HotelInput) -> Result<Option<Hotel>>;

    /// Delete a hotel and its hotel details. Returns false if it did not exist.
    async fn delete_hotel(&self, id: i32) -> Result<bool>;

    async fn hotel_details_for_hotel(&self, hotel_id: i32) -> Result<Vec<HotelDetail>>;

    /// Replace a hotel's capacity set in one transaction. Existing (hotel, room)
    /// pairs keep their id; pairs absent from `details` are removed.
    async fn replace_hotel_details(
        &self,
        hotel_id: i32,
        details: Vec<HotelDetailInput>,
    ) -> Result<Vec<HotelDetail>>;

    // ---- promotions ----

    /// Insert a promotion with per-room discount percents
    async fn insert_promotion(
        &self,
        promotion: &PromotionInput,
        details: Vec<(i32, Decimal)>,
    ) -> Result<PromotionWithDetails>;

    /// Update a promotion and replace its details. `None` if it does not exist.
    async fn update_promotion(
        &self,
        id: i32,
        promotion: &PromotionInput,
        details: Vec<(i32, Decimal)>,
    ) -> Result<Option<PromotionWithDetails>>;

    /// Delete a promotion and its details. Returns false if it did not exist.
    async fn delete_promotion(&self, id: i32) -> Result<bool>;

    async fn list_promotions(&self) -> Result<Vec<PromotionWithDetails>>;

    // ---- rooms and services ----

    async fn list_rooms(&self) -> Result<Vec<Room>>;

    /// Insert a room type with its `image_paths`
    async fn insert_room(&self, room: &RoomInput) -> Result<Room>;

    /// Update a room's fields, drop `remove_image_paths` and attach
    /// `image_paths`. `None` if it does not exist.
    async fn update_room(&self, id: i32, room: &RoomInput) -> Result<Option<Room>>;

    /// Delete a room type with its images, service bindings, capacity records
    /// and promotion details. `Conflict` while a booking references it.
    async fn delete_room(&self, id: i32) -> Result<bool>;

    async fn list_services(&self) -> Result<Vec<ServiceWithRooms>>;

    async fn insert_service(
        &self,
        service: &ServiceInput,
        room_ids: &[i32],
    ) -> Result<ServiceWithRooms>;

    /// Update a service and replace its room bindings. `None` if it does not exist.
    async fn update_service(
        &self,
        id: i32,
        service: &ServiceInput,
        room_ids: &[i32],
    ) -> Result<Option<ServiceWithRooms>>;

    async fn delete_service(&self, id: i32) -> Result<bool>;

    // ---- reports ----

    /// Lines of non-cancelled bookings made on days in `[from, until)`,
    /// oldest first
    async fn report_lines(&self, from: NaiveDate, until: NaiveDate) -> Result<Vec<ReportLine>>;
}

/// Initialize the configured store
pub async fn init_store(config: &Config) -> anyhow::Result<Arc<dyn InventoryStore>> {
    match config.storage {
        StorageKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
            info!("Storage: postgres (max {} connections)", config.db_max_connections);
            let store = PgStore::connect(url, config.db_max_connections).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        StorageKind::Memory => {
            info!("Storage: in-memory demo catalog");
            Ok(Arc::new(MemoryStore::with_demo_catalog().await?))
        }
    }
}

/// Shorthand used by both backends when a referenced row is missing
pub(crate) fn missing(entity: &'static str, id: i32) -> AppError {
    AppError::not_found(entity, id)
}

/// Units requested per hotel detail, in lock order
pub(crate) fn demand_by_detail(lines: &[NewRoomDetail]) -> BTreeMap<i32, i64> {
    let mut demand = BTreeMap::new();
    for line in lines {
        *demand.entry(line.hotel_detail_id).or_insert(0) += i64::from(line.quantity);
    }
    demand
}

/// Reject a booking whose lines would overbook a hotel detail
pub(crate) fn ensure_capacity(
    hotel_detail_id: i32,
    room_count: i32,
    booked: i64,
    requested: i64,
) -> Result<()> {
    let left = (i64::from(room_count) - booked).max(0);
    if requested > left {
        return Err(AppError::Conflict(format!(
            "hotel detail {} has {} room(s) left for the stay, {} requested",
            hotel_detail_id, left, requested
        )));
    }
    Ok(())
}

/// Midnight UTC opening a day
pub(crate) fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Trimmed, non-empty, first-seen-order paths
pub(crate) fn clean_paths(paths: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for path in paths.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        if !cleaned.iter().any(|seen| seen == path) {
            cleaned.push(path.to_string());
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(hotel_detail_id: i32, quantity: i32) -> NewRoomDetail {
        NewRoomDetail {
            room_id: 1,
            hotel_detail_id,
            quantity,
            adult_count: 1,
            children_count: 0,
        }
    }

    #[test]
    fn test_demand_sums_per_detail_in_id_order() {
        let demand = demand_by_detail(&[line(7, 1), line(3, 2), line(7, 2)]);
        assert_eq!(demand.into_iter().collect::<Vec<_>>(), vec![(3, 2), (7, 3)]);
    }

    #[test]
    fn test_ensure_capacity() {
        assert!(ensure_capacity(1, 3, 1, 2).is_ok());
        assert!(matches!(
            ensure_capacity(1, 3, 2, 2),
            Err(AppError::Conflict(_))
        ));
        // Overbooked already: nothing left, never negative
        assert!(ensure_capacity(1, 1, 4, 1).is_err());
    }

    #[test]
    fn test_clean_paths_trims_and_dedupes() {
        let paths = vec![
            " /media/a.jpg ".to_string(),
            "".to_string(),
            "/media/a.jpg".to_string(),
            "/media/b.jpg".to_string(),
        ];
        assert_eq!(clean_paths(&paths), vec!["/media/a.jpg", "/media/b.jpg"]);
    }
}
