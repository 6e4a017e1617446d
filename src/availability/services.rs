//! Availability search over the inventory store.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::cache::AppCache;
use crate::db::InventoryStore;
use crate::error::Result;
use crate::models::{RoomFilters, RoomStatus, StayRange};
use crate::pricing::calculators::effective_unit_price;
use crate::pricing::services::active_promotions_by_room;

use super::responses::RoomAvailability;

/// Search bookable hotel-room combinations.
///
/// Only hotel details whose status is `Available` are candidates. With a
/// stay, rooms booked by non-cancelled overlapping bookings are subtracted
/// and a combination is kept while `booked < room_count`. Results are ordered
/// by room id, then hotel detail id.
pub async fn search(
    store: &dyn InventoryStore,
    cache: &AppCache,
    filters: &RoomFilters,
    stay: Option<&StayRange>,
    as_of: Option<NaiveDate>,
) -> Result<Vec<RoomAvailability>> {
    let mut candidates = store.find_candidates(filters).await?;
    candidates.retain(|c| c.detail_status == RoomStatus::Available);

    let booked: HashMap<i32, i64> = match stay {
        Some(stay) if !candidates.is_empty() => {
            let ids: Vec<i32> = candidates.iter().map(|c| c.hotel_detail_id).collect();
            store.booked_quantities(&ids, stay).await?
        }
        _ => HashMap::new(),
    };

    let mut available: Vec<_> = candidates
        .into_iter()
        .filter_map(|c| {
            let taken = booked.get(&c.hotel_detail_id).copied().unwrap_or(0);
            let remaining = i64::from(c.room_count) - taken;
            (remaining > 0).then_some((c, remaining))
        })
        .collect();
    available.sort_by_key(|(c, _)| (c.room_id, c.hotel_detail_id));

    let mut room_ids: Vec<i32> = available.iter().map(|(c, _)| c.room_id).collect();
    room_ids.dedup();

    let media = cache.room_media(store, &room_ids).await?;
    let promotions = active_promotions_by_room(store, &room_ids, as_of).await?;

    debug!(
        results = available.len(),
        rooms = room_ids.len(),
        dated = stay.is_some(),
        "Availability search"
    );

    Ok(available
        .into_iter()
        .map(|(c, remaining)| {
            let promotion = promotions.get(&c.room_id).cloned();
            let attachments = media.get(&c.room_id);
            RoomAvailability {
                hotel_detail_id: c.hotel_detail_id,
                hotel_id: c.hotel_id,
                hotel_name: c.hotel_name,
                room_id: c.room_id,
                room_name: c.room_name,
                description: c.description,
                size: c.size,
                bed_count: c.bed_count,
                price: c.price,
                effective_price: effective_unit_price(c.price, promotion.as_ref()),
                remaining_rooms: remaining,
                image_paths: attachments
                    .map(|m| m.image_paths.clone())
                    .unwrap_or_default(),
                services: attachments.map(|m| m.services.clone()).unwrap_or_default(),
                promotion,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, CapacityEffect, GuestContact, NewBooking, NewRoomDetail};
    use crate::db::MemoryStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn book(
        store: &MemoryStore,
        room_id: i32,
        hotel_detail_id: i32,
        quantity: i32,
        stay: StayRange,
    ) -> i32 {
        store
            .insert_booking(
                NewBooking {
                    user_id: 1,
                    room_id,
                    contact: GuestContact {
                        full_name: "Minh Tran".to_string(),
                        email: "minh@example.com".to_string(),
                        phone: String::new(),
                        additional_request: None,
                    },
                    booking_date: Utc::now(),
                    stay,
                    status: BookingStatus::Pending,
                },
                vec![NewRoomDetail {
                    room_id,
                    hotel_detail_id,
                    quantity,
                    adult_count: 2,
                    children_count: 0,
                }],
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_overlapping_booking_excludes_full_hotel_detail() {
        let store = MemoryStore::new();
        let room = store.add_room("Deluxe", "", 30.0, dec!(1000000), 2).await;
        let hotel = store.add_hotel("Hana Riverside", "").await;
        let hd = store.add_hotel_detail(hotel.id, room.id, 2).await;
        book(
            &store,
            room.id,
            hd.id,
            2,
            StayRange::new(date(2024, 6, 11), date(2024, 6, 13)).unwrap(),
        )
        .await;

        let cache = AppCache::new();
        let filters = RoomFilters::default();

        let overlapping = StayRange::new(date(2024, 6, 10), date(2024, 6, 12)).unwrap();
        let results = search(&store, &cache, &filters, Some(&overlapping), None)
            .await
            .unwrap();
        assert!(results.is_empty());

        // Check-out on the other booking's check-in day does not overlap
        let before = StayRange::new(date(2024, 6, 9), date(2024, 6, 11)).unwrap();
        let results = search(&store, &cache, &filters, Some(&before), None)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].remaining_rooms, 2);
    }

    #[tokio::test]
    async fn test_partial_booking_reduces_remaining() {
        let store = MemoryStore::new();
        let room = store.add_room("Twin", "", 20.0, dec!(500000), 2).await;
        let hotel = store.add_hotel("Hana", "").await;
        let hd = store.add_hotel_detail(hotel.id, room.id, 5).await;
        let stay = StayRange::new(date(2024, 6, 10), date(2024, 6, 12)).unwrap();
        book(&store, room.id, hd.id, 3, stay).await;

        let results = search(&store, &AppCache::new(), &RoomFilters::default(), Some(&stay), None)
            .await
            .unwrap();
        assert_eq!(results[0].remaining_rooms, 2);
    }

    #[tokio::test]
    async fn test_cancelled_bookings_do_not_count() {
        let store = MemoryStore::new();
        let room = store.add_room("Deluxe", "", 30.0, dec!(1000000), 2).await;
        let hotel = store.add_hotel("Hana", "").await;
        let hd = store.add_hotel_detail(hotel.id, room.id, 2).await;
        let stay = StayRange::new(date(2024, 6, 10), date(2024, 6, 12)).unwrap();
        let booking_id = book(&store, room.id, hd.id, 2, stay).await;
        store
            .transition_status(
                booking_id,
                BookingStatus::Pending,
                BookingStatus::Cancelled,
                CapacityEffect::None,
            )
            .await
            .unwrap();

        let results = search(&store, &AppCache::new(), &RoomFilters::default(), Some(&stay), None)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].remaining_rooms, 2);
    }

    #[tokio::test]
    async fn test_only_available_hotel_details_are_candidates() {
        let store = MemoryStore::new();
        let room = store.add_room("Deluxe", "", 30.0, dec!(1000000), 2).await;
        let open = store.add_hotel("Hana Open", "").await;
        let closed = store.add_hotel("Hana Works", "").await;
        store.add_hotel_detail(open.id, room.id, 2).await;
        let under_works = store.add_hotel_detail(closed.id, room.id, 2).await;
        store
            .set_hotel_detail_status(under_works.id, RoomStatus::Maintenance)
            .await;

        let results = search(&store, &AppCache::new(), &RoomFilters::default(), None, None)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].hotel_name, "Hana Open");
    }

    #[tokio::test]
    async fn test_results_ordered_and_annotated() {
        let store = MemoryStore::with_demo_catalog().await.unwrap();
        let filters = RoomFilters {
            room_name: Some("ROOM".to_string()),
            max_price: Some(dec!(2000000)),
            ..Default::default()
        };

        let results = search(&store, &AppCache::new(), &filters, None, None)
            .await
            .unwrap();

        // Standard in both hotels, then Deluxe
        assert_eq!(results.len(), 3);
        let keys: Vec<(i32, i32)> = results
            .iter()
            .map(|r| (r.room_id, r.hotel_detail_id))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        let deluxe = results.iter().find(|r| r.room_name == "Deluxe Room").unwrap();
        assert_eq!(deluxe.promotion.as_ref().unwrap().discount_percent, dec!(15.00));
        assert_eq!(deluxe.effective_price, dec!(1700000));
        assert_eq!(deluxe.services, vec!["Free Wi-Fi".to_string()]);
        assert_eq!(deluxe.image_paths.len(), 1);
    }

    #[tokio::test]
    async fn test_no_matches_is_empty() {
        let store = MemoryStore::with_demo_catalog().await.unwrap();
        let filters = RoomFilters {
            hotel_name: Some("nowhere".to_string()),
            ..Default::default()
        };
        let results = search(&store, &AppCache::new(), &filters, None, None)
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
