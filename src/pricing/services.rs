//! Pricing service functions with store access.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::db::InventoryStore;
use crate::error::Result;
use crate::models::{ActivePromotion, Room, StayRange};

use super::calculators::{discount_percent, resolve_price};
use super::models::{PriceResolution, PricingPolicy};
use super::promotions::best_by_room;

/// Today in UTC, the default `as_of` for promotion lookups
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Best promotion running on `as_of` for each of the given rooms.
///
/// Rooms without an active promotion are absent from the map.
pub async fn active_promotions_by_room(
    store: &dyn InventoryStore,
    room_ids: &[i32],
    as_of: Option<NaiveDate>,
) -> Result<HashMap<i32, ActivePromotion>> {
    if room_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let as_of = as_of.unwrap_or_else(today);
    let candidates = store.active_promotions(room_ids, as_of).await?;
    debug!(
        rooms = room_ids.len(),
        candidates = candidates.len(),
        %as_of,
        "Resolving active promotions"
    );

    Ok(best_by_room(candidates))
}

/// Price one room over a stay with its best active promotion
pub async fn quote_room(
    store: &dyn InventoryStore,
    policy: &PricingPolicy,
    room: &Room,
    adult_count: i32,
    quantity: i32,
    stay: &StayRange,
    as_of: Option<NaiveDate>,
) -> Result<PriceResolution> {
    let promotions = active_promotions_by_room(store, &[room.id], as_of).await?;
    Ok(resolve_price(
        policy,
        room,
        adult_count,
        quantity,
        stay.nights(),
        promotions.get(&room.id),
    ))
}

/// Discount percent per room for a promotion amount.
///
/// Rooms the store does not know are skipped.
pub async fn promotion_percents(
    store: &dyn InventoryStore,
    discount_amount: Decimal,
    room_ids: &[i32],
) -> Result<Vec<(i32, Decimal)>> {
    let rooms = store.get_rooms(room_ids).await?;

    let mut seen = Vec::with_capacity(room_ids.len());
    let mut percents = Vec::with_capacity(room_ids.len());
    for room_id in room_ids {
        if seen.contains(room_id) {
            continue;
        }
        seen.push(*room_id);
        match rooms.get(room_id) {
            Some(room) => percents.push((*room_id, discount_percent(discount_amount, room.price))),
            None => debug!(room_id, "Skipping unknown room for promotion"),
        }
    }
    Ok(percents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_quote_room_scenarios() {
        let store = MemoryStore::new();
        let room_id = store
            .add_room("Deluxe", "", 30.0, dec!(1000000), 2)
            .await
            .id;
        let input = crate::models::PromotionInput {
            name: "Summer".to_string(),
            discount_amount: dec!(100000),
            start_date: day(2024, 6, 1),
            end_date: day(2024, 6, 30),
            room_ids: vec![room_id],
        };
        let details = promotion_percents(&store, input.discount_amount, &input.room_ids)
            .await
            .unwrap();
        assert_eq!(details, vec![(room_id, dec!(10.00))]);
        store.insert_promotion(&input, details).await.unwrap();

        let room = store.get_rooms(&[room_id]).await.unwrap()[&room_id].clone();
        let stay = StayRange::new(day(2024, 6, 10), day(2024, 6, 12)).unwrap();
        let policy = PricingPolicy::default();

        let calm = quote_room(&store, &policy, &room, 2, 1, &stay, Some(day(2024, 6, 5)))
            .await
            .unwrap();
        assert_eq!(calm.subtotal, dec!(1800000));

        let crowded = quote_room(&store, &policy, &room, 5, 1, &stay, Some(day(2024, 6, 5)))
            .await
            .unwrap();
        assert_eq!(crowded.extra_charge, dec!(400000));
        assert_eq!(crowded.subtotal, dec!(2200000));

        // outside the promotion window
        let later = quote_room(&store, &policy, &room, 2, 1, &stay, Some(day(2024, 7, 1)))
            .await
            .unwrap();
        assert!(later.promotion.is_none());
        assert_eq!(later.subtotal, dec!(2000000));
    }

    #[tokio::test]
    async fn test_promotion_percents_skip_unknown_rooms() {
        let store = MemoryStore::new();
        let room_id = store.add_room("Twin", "", 20.0, dec!(400000), 2).await.id;

        let percents = promotion_percents(&store, dec!(100000), &[room_id, 999, room_id])
            .await
            .unwrap();

        assert_eq!(percents, vec![(room_id, dec!(25.00))]);
    }

    #[tokio::test]
    async fn test_no_rooms_no_lookup() {
        let store = MemoryStore::new();
        let promotions = active_promotions_by_room(&store, &[], None).await.unwrap();
        assert!(promotions.is_empty());
    }
}
