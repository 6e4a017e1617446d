//! In-memory inventory store.
//!
//! Arena-style tables keyed by integer id behind one `RwLock`, so every
//! multi-row write is applied under a single write guard and is atomic with
//! respect to other callers.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::RwLock;
use tracing::warn;

use super::{
    clean_paths, demand_by_detail, ensure_capacity, missing, InventoryStore, PromotionWithDetails,
};
use crate::error::{AppError, Result};
use crate::models::{
    ActivePromotion, Booking, BookingStatus, CandidateRow, CapacityEffect, GuestContact, Hotel,
    HotelDetail, HotelDetailInput, HotelInput, HotelStatus, NewBooking, NewRoomDetail, Promotion,
    PromotionDetail, PromotionInput, ReportLine, Room, RoomDetail, RoomFilters, RoomInput,
    RoomStatus, Service, ServiceInput, ServiceWithRooms, StayRange,
};

#[derive(Default)]
struct Tables {
    last_id: i32,
    hotels: BTreeMap<i32, Hotel>,
    rooms: BTreeMap<i32, Room>,
    hotel_details: BTreeMap<i32, HotelDetail>,
    bookings: BTreeMap<i32, Booking>,
    room_details: BTreeMap<i32, RoomDetail>,
    promotions: BTreeMap<i32, Promotion>,
    promotion_details: BTreeMap<i32, PromotionDetail>,
    services: BTreeMap<i32, Service>,
    /// (room_id, service_id)
    service_details: Vec<(i32, i32)>,
    /// (room_id, path)
    images: Vec<(i32, String)>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn promotion_with_details(&self, id: i32) -> Option<PromotionWithDetails> {
        let promotion = self.promotions.get(&id)?.clone();
        let details = self
            .promotion_details
            .values()
            .filter(|d| d.promotion_id == id)
            .cloned()
            .collect();
        Some(PromotionWithDetails { promotion, details })
    }

    fn write_promotion_details(&mut self, promotion_id: i32, details: Vec<(i32, Decimal)>) {
        self.promotion_details
            .retain(|_, d| d.promotion_id != promotion_id);
        for (room_id, discount_percent) in details {
            let id = self.next_id();
            self.promotion_details.insert(
                id,
                PromotionDetail {
                    id,
                    promotion_id,
                    room_id,
                    discount_percent,
                },
            );
        }
    }

    /// Units of `hotel_detail_id` held by non-cancelled bookings overlapping `stay`
    fn booked_for(&self, hotel_detail_id: i32, stay: &StayRange) -> i64 {
        self.room_details
            .values()
            .filter(|line| line.hotel_detail_id == Some(hotel_detail_id))
            .filter(|line| {
                self.bookings.get(&line.booking_id).is_some_and(|b| {
                    b.status != BookingStatus::Cancelled && stay.overlaps(b.check_in, b.check_out)
                })
            })
            .map(|line| i64::from(line.quantity))
            .sum()
    }

    fn service_with_rooms(&self, id: i32) -> Option<ServiceWithRooms> {
        let service = self.services.get(&id)?.clone();
        let room_ids = self
            .service_details
            .iter()
            .filter(|(_, service_id)| *service_id == id)
            .map(|(room_id, _)| *room_id)
            .collect();
        Some(ServiceWithRooms { service, room_ids })
    }

    fn bind_service(&mut self, service_id: i32, room_ids: &[i32]) {
        self.service_details.retain(|(_, s)| *s != service_id);
        for room_id in room_ids {
            self.service_details.push((*room_id, service_id));
        }
    }

    fn remove_hotel_detail(&mut self, id: i32) {
        self.hotel_details.remove(&id);
        for line in self.room_details.values_mut() {
            if line.hotel_detail_id == Some(id) {
                line.hotel_detail_id = None;
            }
        }
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a small catalog: two hotels, four room types,
    /// services, images and one running promotion
    pub async fn with_demo_catalog() -> Result<Self> {
        let store = Self::new();

        let standard = store
            .add_room("Standard Room", "Comfortable room for a short stay", 25.0, dec!(1500000), 1)
            .await;
        let deluxe = store
            .add_room("Deluxe Room", "Spacious room with city view", 30.0, dec!(2000000), 1)
            .await;
        let family = store
            .add_room("Family Room", "Room for families with several beds", 40.0, dec!(2500000), 3)
            .await;
        let suite = store
            .add_room("Suite", "Suite with a private lounge", 55.0, dec!(3000000), 2)
            .await;

        let riverside = store.add_hotel("Hana Riverside", "12 River Road").await;
        let downtown = store.add_hotel("Hana Downtown", "1 Central Square").await;

        for (hotel, room, count) in [
            (riverside.id, standard.id, 10),
            (riverside.id, deluxe.id, 6),
            (riverside.id, suite.id, 2),
            (downtown.id, standard.id, 8),
            (downtown.id, family.id, 4),
        ] {
            store.add_hotel_detail(hotel, room, count).await;
        }

        for room in [&standard, &deluxe, &family, &suite] {
            store.add_service(room.id, "Free Wi-Fi").await;
            store
                .add_image(room.id, &format!("rooms/{}.jpg", room.id))
                .await;
        }
        store.add_service(suite.id, "Spa").await;

        let today = Utc::now().date_naive();
        let promotion = PromotionInput {
            name: "Summer deal".to_string(),
            discount_amount: dec!(300000),
            start_date: today,
            end_date: today + chrono::Duration::days(60),
            room_ids: vec![deluxe.id, suite.id],
        };
        let details = vec![(deluxe.id, dec!(15.00)), (suite.id, dec!(10.00))];
        store.insert_promotion(&promotion, details).await?;

        Ok(store)
    }

    pub async fn add_room(
        &self,
        name: &str,
        description: &str,
        size: f64,
        price: Decimal,
        bed_count: i32,
    ) -> Room {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let room = Room {
            id,
            name: name.to_string(),
            description: description.to_string(),
            size,
            price,
            bed_count,
        };
        t.rooms.insert(id, room.clone());
        room
    }

    pub async fn add_hotel(&self, name: &str, address: &str) -> Hotel {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let hotel = Hotel {
            id,
            name: name.to_string(),
            address: address.to_string(),
            description: None,
            phone_number: None,
            status: HotelStatus::Open,
            manager_id: None,
        };
        t.hotels.insert(id, hotel.clone());
        hotel
    }

    pub async fn add_hotel_detail(&self, hotel_id: i32, room_id: i32, room_count: i32) -> HotelDetail {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let detail = HotelDetail {
            id,
            hotel_id,
            room_id,
            room_count,
            status: RoomStatus::Available,
        };
        t.hotel_details.insert(id, detail.clone());
        detail
    }

    pub async fn set_hotel_detail_status(&self, id: i32, status: RoomStatus) {
        if let Some(detail) = self.tables.write().await.hotel_details.get_mut(&id) {
            detail.status = status;
        }
    }

    /// Attach a service to a room, creating the service by name if needed
    pub async fn add_service(&self, room_id: i32, name: &str) {
        let mut t = self.tables.write().await;
        let existing = t
            .services
            .values()
            .find(|s| s.name == name)
            .map(|s| s.id);
        let service_id = match existing {
            Some(id) => id,
            None => {
                let id = t.next_id();
                t.services.insert(
                    id,
                    Service {
                        id,
                        name: name.to_string(),
                        price: Decimal::ZERO,
                        unit: String::new(),
                        description: None,
                    },
                );
                id
            }
        };
        t.service_details.push((room_id, service_id));
    }

    pub async fn add_image(&self, room_id: i32, path: &str) {
        self.tables
            .write()
            .await
            .images
            .push((room_id, path.to_string()));
    }

    pub async fn hotel_detail(&self, id: i32) -> Option<HotelDetail> {
        self.tables.read().await.hotel_details.get(&id).cloned()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn find_candidates(&self, filters: &RoomFilters) -> Result<Vec<CandidateRow>> {
        let t = self.tables.read().await;
        let rows = t
            .hotel_details
            .values()
            .filter_map(|hd| {
                let hotel = t.hotels.get(&hd.hotel_id)?;
                let room = t.rooms.get(&hd.room_id)?;
                filters.matches(&hotel.name, room).then(|| CandidateRow {
                    hotel_detail_id: hd.id,
                    hotel_id: hotel.id,
                    hotel_name: hotel.name.clone(),
                    room_count: hd.room_count,
                    detail_status: hd.status,
                    room_id: room.id,
                    room_name: room.name.clone(),
                    description: room.description.clone(),
                    size: room.size,
                    price: room.price,
                    bed_count: room.bed_count,
                })
            })
            .collect();
        Ok(rows)
    }

    async fn booked_quantities(
        &self,
        hotel_detail_ids: &[i32],
        stay: &StayRange,
    ) -> Result<HashMap<i32, i64>> {
        let t = self.tables.read().await;
        Ok(hotel_detail_ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|id| (*id, t.booked_for(*id, stay)))
            .filter(|(_, booked)| *booked > 0)
            .collect())
    }

    async fn get_rooms(&self, room_ids: &[i32]) -> Result<HashMap<i32, Room>> {
        let t = self.tables.read().await;
        Ok(room_ids
            .iter()
            .filter_map(|id| t.rooms.get(id).map(|r| (*id, r.clone())))
            .collect())
    }

    async fn room_images(&self, room_ids: &[i32]) -> Result<HashMap<i32, Vec<String>>> {
        let t = self.tables.read().await;
        let mut images: HashMap<i32, Vec<String>> = HashMap::new();
        for (room_id, path) in &t.images {
            if room_ids.contains(room_id) {
                images.entry(*room_id).or_default().push(path.clone());
            }
        }
        Ok(images)
    }

    async fn room_services(&self, room_ids: &[i32]) -> Result<HashMap<i32, Vec<String>>> {
        let t = self.tables.read().await;
        let mut services: HashMap<i32, BTreeSet<String>> = HashMap::new();
        for (room_id, service_id) in &t.service_details {
            if !room_ids.contains(room_id) {
                continue;
            }
            if let Some(service) = t
                .services
                .get(service_id)
                .filter(|s| !s.name.trim().is_empty())
            {
                services
                    .entry(*room_id)
                    .or_default()
                    .insert(service.name.clone());
            }
        }
        Ok(services
            .into_iter()
            .map(|(room_id, names)| (room_id, names.into_iter().collect()))
            .collect())
    }

    async fn active_promotions(
        &self,
        room_ids: &[i32],
        as_of: NaiveDate,
    ) -> Result<Vec<ActivePromotion>> {
        let t = self.tables.read().await;
        Ok(t.promotion_details
            .values()
            .filter(|d| room_ids.contains(&d.room_id))
            .filter_map(|d| {
                let promotion = t.promotions.get(&d.promotion_id)?;
                promotion.is_active_on(as_of).then(|| ActivePromotion {
                    promotion_id: promotion.id,
                    room_id: d.room_id,
                    name: promotion.name.clone(),
                    discount_amount: promotion.discount_amount,
                    discount_percent: d.discount_percent,
                })
            })
            .collect())
    }

    async fn get_hotel_details(&self, ids: &[i32]) -> Result<HashMap<i32, HotelDetail>> {
        let t = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| t.hotel_details.get(id).map(|hd| (*id, hd.clone())))
            .collect())
    }

    async fn get_hotels(&self, ids: &[i32]) -> Result<HashMap<i32, Hotel>> {
        let t = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| t.hotels.get(id).map(|h| (*id, h.clone())))
            .collect())
    }

    async fn insert_booking(
        &self,
        booking: NewBooking,
        lines: Vec<NewRoomDetail>,
    ) -> Result<Booking> {
        let mut t = self.tables.write().await;
        for (hd_id, requested) in demand_by_detail(&lines) {
            let room_count = t
                .hotel_details
                .get(&hd_id)
                .map(|hd| hd.room_count)
                .ok_or_else(|| missing("HotelDetail", hd_id))?;
            ensure_capacity(hd_id, room_count, t.booked_for(hd_id, &booking.stay), requested)?;
        }

        let id = t.next_id();
        let row = Booking {
            id,
            user_id: booking.user_id,
            room_id: booking.room_id,
            full_name: booking.contact.full_name,
            email: booking.contact.email,
            phone: booking.contact.phone,
            additional_request: booking.contact.additional_request,
            booking_date: booking.booking_date,
            check_in: booking.stay.check_in,
            check_out: booking.stay.check_out,
            status: booking.status,
        };
        t.bookings.insert(id, row.clone());

        for line in lines {
            let line_id = t.next_id();
            t.room_details.insert(
                line_id,
                RoomDetail {
                    id: line_id,
                    booking_id: id,
                    room_id: line.room_id,
                    hotel_detail_id: Some(line.hotel_detail_id),
                    quantity: line.quantity,
                    adult_count: line.adult_count,
                    children_count: line.children_count,
                    consumed: 0,
                },
            );
        }

        Ok(row)
    }

    async fn get_booking(&self, id: i32) -> Result<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn room_details(&self, booking_id: i32) -> Result<Vec<RoomDetail>> {
        let t = self.tables.read().await;
        Ok(t.room_details
            .values()
            .filter(|rd| rd.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn bookings_for_user(&self, user_id: i32) -> Result<Vec<Booking>> {
        let t = self.tables.read().await;
        let mut bookings: Vec<Booking> = t
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booking_date.cmp(&a.booking_date).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }

    async fn update_contact(&self, booking_id: i32, contact: &GuestContact) -> Result<()> {
        let mut t = self.tables.write().await;
        let booking = t
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| missing("Booking", booking_id))?;
        booking.full_name = contact.full_name.clone();
        booking.email = contact.email.clone();
        booking.phone = contact.phone.clone();
        booking.additional_request = contact.additional_request.clone();
        Ok(())
    }

    async fn transition_status(
        &self,
        booking_id: i32,
        from: BookingStatus,
        to: BookingStatus,
        effect: CapacityEffect,
    ) -> Result<bool> {
        let mut guard = self.tables.write().await;
        let t = &mut *guard;
        match t.bookings.get_mut(&booking_id) {
            Some(booking) if booking.status == from => booking.status = to,
            _ => return Ok(false),
        }

        if effect == CapacityEffect::None {
            return Ok(true);
        }

        for line in t
            .room_details
            .values_mut()
            .filter(|rd| rd.booking_id == booking_id)
        {
            let Some(hd_id) = line.hotel_detail_id else {
                continue;
            };
            let Some(detail) = t.hotel_details.get_mut(&hd_id) else {
                continue;
            };
            let adjusted = effect.apply(detail.room_count, line.quantity, line.consumed);
            if adjusted.clamped {
                warn!(
                    booking_id,
                    hotel_detail_id = hd_id,
                    room_count = detail.room_count,
                    quantity = line.quantity,
                    consumed = adjusted.consumed,
                    "Capacity consumption clamped at zero"
                );
            }
            detail.room_count = adjusted.room_count;
            line.consumed = adjusted.consumed;
        }

        Ok(true)
    }

    async fn delete_booking(&self, id: i32) -> Result<bool> {
        let mut t = self.tables.write().await;
        if t.bookings.remove(&id).is_none() {
            return Ok(false);
        }
        t.room_details.retain(|_, rd| rd.booking_id != id);
        Ok(true)
    }

    async fn insert_hotel(&self, input: HotelInput) -> Result<Hotel> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let hotel = Hotel {
            id,
            name: input.name,
            address: input.address,
            description: input.description,
            phone_number: input.phone_number,
            status: input.status,
            manager_id: input.manager_id,
        };
        t.hotels.insert(id, hotel.clone());
        Ok(hotel)
    }

    async fn update_hotel(&self, id: i32, input: HotelInput) -> Result<Option<Hotel>> {
        let mut t = self.tables.write().await;
        let Some(hotel) = t.hotels.get_mut(&id) else {
            return Ok(None);
        };
        hotel.name = input.name;
        hotel.address = input.address;
        hotel.description = input.description;
        hotel.phone_number = input.phone_number;
        hotel.status = input.status;
        hotel.manager_id = input.manager_id;
        Ok(Some(hotel.clone()))
    }

    async fn delete_hotel(&self, id: i32) -> Result<bool> {
        let mut t = self.tables.write().await;
        if t.hotels.remove(&id).is_none() {
            return Ok(false);
        }
        let detail_ids: Vec<i32> = t
            .hotel_details
            .values()
            .filter(|hd| hd.hotel_id == id)
            .map(|hd| hd.id)
            .collect();
        for detail_id in detail_ids {
            t.remove_hotel_detail(detail_id);
        }
        Ok(true)
    }

    async fn hotel_details_for_hotel(&self, hotel_id: i32) -> Result<Vec<HotelDetail>> {
        let t = self.tables.read().await;
        Ok(t.hotel_details
            .values()
            .filter(|hd| hd.hotel_id == hotel_id)
            .cloned()
            .collect())
    }

    async fn replace_hotel_details(
        &self,
        hotel_id: i32,
        details: Vec<HotelDetailInput>,
    ) -> Result<Vec<HotelDetail>> {
        let mut t = self.tables.write().await;
        if !t.hotels.contains_key(&hotel_id) {
            return Err(missing("Hotel", hotel_id));
        }
        if let Some(unknown) = details.iter().find(|d| !t.rooms.contains_key(&d.room_id)) {
            return Err(missing("Room", unknown.room_id));
        }

        let existing: HashMap<i32, i32> = t
            .hotel_details
            .values()
            .filter(|hd| hd.hotel_id == hotel_id)
            .map(|hd| (hd.room_id, hd.id))
            .collect();

        let kept: BTreeSet<i32> = details.iter().map(|d| d.room_id).collect();
        for (room_id, detail_id) in &existing {
            if !kept.contains(room_id) {
                t.remove_hotel_detail(*detail_id);
            }
        }

        let mut written = Vec::with_capacity(details.len());
        for input in details {
            let id = match existing.get(&input.room_id) {
                Some(id) => *id,
                None => t.next_id(),
            };
            let detail = HotelDetail {
                id,
                hotel_id,
                room_id: input.room_id,
                room_count: input.room_count,
                status: input.status,
            };
            t.hotel_details.insert(id, detail.clone());
            written.push(detail);
        }

        Ok(written)
    }

    async fn insert_promotion(
        &self,
        input: &PromotionInput,
        details: Vec<(i32, Decimal)>,
    ) -> Result<PromotionWithDetails> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        t.promotions.insert(
            id,
            Promotion {
                id,
                name: input.name.clone(),
                discount_amount: input.discount_amount,
                start_date: input.start_date,
                end_date: input.end_date,
            },
        );
        t.write_promotion_details(id, details);
        t.promotion_with_details(id)
            .ok_or_else(|| missing("Promotion", id))
    }

    async fn update_promotion(
        &self,
        id: i32,
        input: &PromotionInput,
        details: Vec<(i32, Decimal)>,
    ) -> Result<Option<PromotionWithDetails>> {
        let mut t = self.tables.write().await;
        let Some(promotion) = t.promotions.get_mut(&id) else {
            return Ok(None);
        };
        promotion.name = input.name.clone();
        promotion.discount_amount = input.discount_amount;
        promotion.start_date = input.start_date;
        promotion.end_date = input.end_date;
        t.write_promotion_details(id, details);
        Ok(t.promotion_with_details(id))
    }

    async fn delete_promotion(&self, id: i32) -> Result<bool> {
        let mut t = self.tables.write().await;
        if t.promotions.remove(&id).is_none() {
            return Ok(false);
        }
        t.promotion_details.retain(|_, d| d.promotion_id != id);
        Ok(true)
    }

    async fn list_promotions(&self) -> Result<Vec<PromotionWithDetails>> {
        let t = self.tables.read().await;
        Ok(t.promotions
            .keys()
            .filter_map(|id| t.promotion_with_details(*id))
            .collect())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>> {
        Ok(self.tables.read().await.rooms.values().cloned().collect())
    }

    async fn insert_room(&self, input: &RoomInput) -> Result<Room> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let room = Room {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            size: input.size,
            price: input.price,
            bed_count: input.bed_count,
        };
        t.rooms.insert(id, room.clone());
        for path in clean_paths(&input.image_paths) {
            t.images.push((id, path));
        }
        Ok(room)
    }

    async fn update_room(&self, id: i32, input: &RoomInput) -> Result<Option<Room>> {
        let mut t = self.tables.write().await;
        let Some(room) = t.rooms.get_mut(&id) else {
            return Ok(None);
        };
        room.name = input.name.clone();
        room.description = input.description.clone();
        room.size = input.size;
        room.price = input.price;
        room.bed_count = input.bed_count;
        let room = room.clone();

        let removed = clean_paths(&input.remove_image_paths);
        t.images
            .retain(|(room_id, path)| *room_id != id || !removed.contains(path));
        for path in clean_paths(&input.image_paths) {
            if !t.images.iter().any(|(r, p)| *r == id && *p == path) {
                t.images.push((id, path));
            }
        }
        Ok(Some(room))
    }

    async fn delete_room(&self, id: i32) -> Result<bool> {
        let mut t = self.tables.write().await;
        if !t.rooms.contains_key(&id) {
            return Ok(false);
        }
        let referenced = t.bookings.values().any(|b| b.room_id == id)
            || t.room_details.values().any(|rd| rd.room_id == id);
        if referenced {
            return Err(AppError::Conflict(format!(
                "room {} is referenced by bookings",
                id
            )));
        }

        t.rooms.remove(&id);
        t.images.retain(|(room_id, _)| *room_id != id);
        t.service_details.retain(|(room_id, _)| *room_id != id);
        t.promotion_details.retain(|_, d| d.room_id != id);
        let detail_ids: Vec<i32> = t
            .hotel_details
            .values()
            .filter(|hd| hd.room_id == id)
            .map(|hd| hd.id)
            .collect();
        for detail_id in detail_ids {
            t.remove_hotel_detail(detail_id);
        }
        Ok(true)
    }

    async fn list_services(&self) -> Result<Vec<ServiceWithRooms>> {
        let t = self.tables.read().await;
        Ok(t.services
            .keys()
            .filter_map(|id| t.service_with_rooms(*id))
            .collect())
    }

    async fn insert_service(
        &self,
        input: &ServiceInput,
        room_ids: &[i32],
    ) -> Result<ServiceWithRooms> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        t.services.insert(
            id,
            Service {
                id,
                name: input.name.clone(),
                price: input.price,
                unit: input.unit.clone(),
                description: input.description.clone(),
            },
        );
        t.bind_service(id, room_ids);
        t.service_with_rooms(id).ok_or_else(|| missing("Service", id))
    }

    async fn update_service(
        &self,
        id: i32,
        input: &ServiceInput,
        room_ids: &[i32],
    ) -> Result<Option<ServiceWithRooms>> {
        let mut t = self.tables.write().await;
        let Some(service) = t.services.get_mut(&id) else {
            return Ok(None);
        };
        service.name = input.name.clone();
        service.price = input.price;
        service.unit = input.unit.clone();
        service.description = input.description.clone();
        t.bind_service(id, room_ids);
        Ok(t.service_with_rooms(id))
    }

    async fn delete_service(&self, id: i32) -> Result<bool> {
        let mut t = self.tables.write().await;
        if t.services.remove(&id).is_none() {
            return Ok(false);
        }
        t.service_details.retain(|(_, service_id)| *service_id != id);
        Ok(true)
    }

    async fn report_lines(&self, from: NaiveDate, until: NaiveDate) -> Result<Vec<ReportLine>> {
        let t = self.tables.read().await;
        let mut lines: Vec<(i32, ReportLine)> = t
            .room_details
            .values()
            .filter_map(|rd| {
                let booking = t.bookings.get(&rd.booking_id)?;
                let day = booking.booking_date.date_naive();
                if booking.status == BookingStatus::Cancelled || day < from || day >= until {
                    return None;
                }
                let room = t.rooms.get(&rd.room_id)?;
                let hotel_name = rd
                    .hotel_detail_id
                    .and_then(|hd_id| t.hotel_details.get(&hd_id))
                    .and_then(|hd| t.hotels.get(&hd.hotel_id))
                    .map(|h| h.name.clone());
                Some((
                    rd.id,
                    ReportLine {
                        booking_date: booking.booking_date,
                        room_name: room.name.clone(),
                        hotel_name,
                        quantity: rd.quantity,
                        price: room.price,
                    },
                ))
            })
            .collect();
        lines.sort_by(|(a_id, a), (b_id, b)| {
            a.booking_date.cmp(&b.booking_date).then(a_id.cmp(b_id))
        });
        Ok(lines.into_iter().map(|(_, line)| line).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contact() -> GuestContact {
        GuestContact {
            full_name: "Lan Nguyen".to_string(),
            email: "lan@example.com".to_string(),
            phone: "0900000000".to_string(),
            additional_request: None,
        }
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let store = MemoryStore::new();
        let room = store.add_room("Deluxe", "", 30.0, dec!(2000000), 1).await;
        let hotel = store.add_hotel("Hana", "").await;
        let hd = store.add_hotel_detail(hotel.id, room.id, 4).await;

        let booking = store
            .insert_booking(
                NewBooking {
                    user_id: 1,
                    room_id: room.id,
                    contact: contact(),
                    booking_date: Utc::now(),
                    stay: StayRange::new(date(2024, 6, 10), date(2024, 6, 12)).unwrap(),
                    status: BookingStatus::Pending,
                },
                vec![NewRoomDetail {
                    room_id: room.id,
                    hotel_detail_id: hd.id,
                    quantity: 3,
                    adult_count: 2,
                    children_count: 0,
                }],
            )
            .await
            .unwrap();

        let applied = store
            .transition_status(
                booking.id,
                BookingStatus::Pending,
                BookingStatus::Paid,
                CapacityEffect::Consume,
            )
            .await
            .unwrap();
        assert!(applied);
        assert_eq!(store.hotel_detail(hd.id).await.unwrap().room_count, 1);

        // Stale expectation: nothing is written
        let applied = store
            .transition_status(
                booking.id,
                BookingStatus::Pending,
                BookingStatus::Paid,
                CapacityEffect::Consume,
            )
            .await
            .unwrap();
        assert!(!applied);
        assert_eq!(store.hotel_detail(hd.id).await.unwrap().room_count, 1);
    }

    fn booking(room_id: i32, check_in: NaiveDate, check_out: NaiveDate) -> NewBooking {
        NewBooking {
            user_id: 1,
            room_id,
            contact: contact(),
            booking_date: Utc::now(),
            stay: StayRange::new(check_in, check_out).unwrap(),
            status: BookingStatus::Pending,
        }
    }

    fn line(room_id: i32, hotel_detail_id: i32, quantity: i32) -> NewRoomDetail {
        NewRoomDetail {
            room_id,
            hotel_detail_id,
            quantity,
            adult_count: 1,
            children_count: 0,
        }
    }

    #[tokio::test]
    async fn test_release_returns_only_what_was_consumed() {
        let store = MemoryStore::new();
        let room = store.add_room("Deluxe", "", 30.0, dec!(2000000), 1).await;
        let hotel = store.add_hotel("Hana", "").await;
        let hd = store.add_hotel_detail(hotel.id, room.id, 1).await;

        // Disjoint stays, so both inserts pass the capacity check
        let june = store
            .insert_booking(
                booking(room.id, date(2024, 6, 10), date(2024, 6, 12)),
                vec![line(room.id, hd.id, 1)],
            )
            .await
            .unwrap();
        let july = store
            .insert_booking(
                booking(room.id, date(2024, 7, 10), date(2024, 7, 12)),
                vec![line(room.id, hd.id, 1)],
            )
            .await
            .unwrap();

        for id in [june.id, july.id] {
            store
                .transition_status(
                    id,
                    BookingStatus::Pending,
                    BookingStatus::Paid,
                    CapacityEffect::Consume,
                )
                .await
                .unwrap();
        }
        assert_eq!(store.hotel_detail(hd.id).await.unwrap().room_count, 0);
        let lines = store.room_details(july.id).await.unwrap();
        assert_eq!(lines[0].consumed, 0);

        for id in [june.id, july.id] {
            store
                .transition_status(
                    id,
                    BookingStatus::Paid,
                    BookingStatus::Cancelled,
                    CapacityEffect::Release,
                )
                .await
                .unwrap();
        }
        assert_eq!(store.hotel_detail(hd.id).await.unwrap().room_count, 1);
    }

    #[tokio::test]
    async fn test_insert_booking_rejects_overlapping_overbooking() {
        let store = MemoryStore::new();
        let room = store.add_room("Deluxe", "", 30.0, dec!(2000000), 1).await;
        let hotel = store.add_hotel("Hana", "").await;
        let hd = store.add_hotel_detail(hotel.id, room.id, 2).await;

        store
            .insert_booking(
                booking(room.id, date(2024, 6, 10), date(2024, 6, 12)),
                vec![line(room.id, hd.id, 2)],
            )
            .await
            .unwrap();

        let result = store
            .insert_booking(
                booking(room.id, date(2024, 6, 11), date(2024, 6, 13)),
                vec![line(room.id, hd.id, 1)],
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        // Back-to-back stay does not overlap
        store
            .insert_booking(
                booking(room.id, date(2024, 6, 12), date(2024, 6, 14)),
                vec![line(room.id, hd.id, 2)],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_room_image_edits_and_delete_guard() {
        let store = MemoryStore::new();
        let input = RoomInput {
            name: "Loft".to_string(),
            description: String::new(),
            size: 35.0,
            price: dec!(1800000),
            bed_count: 2,
            image_paths: vec!["rooms/a.jpg".to_string(), "rooms/b.jpg".to_string()],
            remove_image_paths: vec![],
        };
        let room = store.insert_room(&input).await.unwrap();

        let edit = RoomInput {
            image_paths: vec!["rooms/c.jpg".to_string()],
            remove_image_paths: vec!["rooms/a.jpg".to_string()],
            ..input
        };
        store.update_room(room.id, &edit).await.unwrap().unwrap();
        let images = store.room_images(&[room.id]).await.unwrap();
        assert_eq!(images[&room.id], vec!["rooms/b.jpg", "rooms/c.jpg"]);

        let hotel = store.add_hotel("Hana", "").await;
        let hd = store.add_hotel_detail(hotel.id, room.id, 1).await;
        store
            .insert_booking(
                booking(room.id, date(2024, 6, 10), date(2024, 6, 12)),
                vec![line(room.id, hd.id, 1)],
            )
            .await
            .unwrap();
        assert!(matches!(
            store.delete_room(room.id).await,
            Err(AppError::Conflict(_))
        ));
        assert!(!store.delete_room(999).await.unwrap());
    }

    #[tokio::test]
    async fn test_report_lines_skip_cancelled_and_out_of_window() {
        let store = MemoryStore::new();
        let room = store.add_room("Deluxe", "", 30.0, dec!(2000000), 1).await;
        let hotel = store.add_hotel("Hana", "").await;
        let hd = store.add_hotel_detail(hotel.id, room.id, 5).await;
        let today = Utc::now().date_naive();

        let kept = store
            .insert_booking(
                booking(room.id, date(2024, 6, 10), date(2024, 6, 12)),
                vec![line(room.id, hd.id, 2)],
            )
            .await
            .unwrap();
        let cancelled = store
            .insert_booking(
                booking(room.id, date(2024, 6, 10), date(2024, 6, 12)),
                vec![line(room.id, hd.id, 1)],
            )
            .await
            .unwrap();
        store
            .transition_status(
                cancelled.id,
                BookingStatus::Pending,
                BookingStatus::Cancelled,
                CapacityEffect::None,
            )
            .await
            .unwrap();

        let lines = store
            .report_lines(today, today + chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].hotel_name.as_deref(), Some("Hana"));
        assert_eq!(lines[0].booking_date, kept.booking_date);

        let before = store
            .report_lines(today - chrono::Duration::days(7), today)
            .await
            .unwrap();
        assert!(before.is_empty());
    }

    #[tokio::test]
    async fn test_replace_hotel_details_keeps_ids_of_kept_rooms() {
        let store = MemoryStore::new();
        let a = store.add_room("A", "", 20.0, dec!(100), 1).await;
        let b = store.add_room("B", "", 20.0, dec!(100), 1).await;
        let c = store.add_room("C", "", 20.0, dec!(100), 1).await;
        let hotel = store.add_hotel("Hana", "").await;
        let hd_a = store.add_hotel_detail(hotel.id, a.id, 2).await;
        store.add_hotel_detail(hotel.id, b.id, 2).await;

        let written = store
            .replace_hotel_details(
                hotel.id,
                vec![
                    HotelDetailInput {
                        room_id: a.id,
                        room_count: 5,
                        status: RoomStatus::Available,
                    },
                    HotelDetailInput {
                        room_id: c.id,
                        room_count: 1,
                        status: RoomStatus::Maintenance,
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(written[0].id, hd_a.id);
        assert_eq!(written[0].room_count, 5);

        let details = store.hotel_details_for_hotel(hotel.id).await.unwrap();
        let rooms: BTreeSet<i32> = details.iter().map(|d| d.room_id).collect();
        assert_eq!(rooms, BTreeSet::from([a.id, c.id]));
    }

    #[tokio::test]
    async fn test_replace_hotel_details_rejects_unknown_room() {
        let store = MemoryStore::new();
        let hotel = store.add_hotel("Hana", "").await;
        let result = store
            .replace_hotel_details(
                hotel.id,
                vec![HotelDetailInput {
                    room_id: 999,
                    room_count: 1,
                    status: RoomStatus::Available,
                }],
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_demo_catalog_has_candidates() {
        let store = MemoryStore::with_demo_catalog().await.unwrap();
        let rows = store.find_candidates(&RoomFilters::default()).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(store.list_promotions().await.unwrap().len(), 1);
    }
}
