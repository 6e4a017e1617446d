//! PostgreSQL inventory store.
//!
//! Every multi-row write runs inside one transaction; a failure part-way
//! rolls the whole unit back when the transaction is dropped.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;

use super::{
    clean_paths, day_start, demand_by_detail, ensure_capacity, missing, InventoryStore,
    PromotionWithDetails,
};
use crate::error::{AppError, Result};
use crate::models::{
    ActivePromotion, Booking, BookingStatus, CandidateRow, CapacityEffect, GuestContact, Hotel,
    HotelDetail, HotelDetailInput, HotelInput, NewBooking, NewRoomDetail, Promotion,
    PromotionDetail, PromotionInput, ReportLine, Room, RoomDetail, RoomFilters, RoomInput,
    Service, ServiceInput, ServiceWithRooms, StayRange,
};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending migrations from `migrations/`
    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_promotion(
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> Result<Option<PromotionWithDetails>> {
        let promotion = sqlx::query_as::<_, Promotion>(
            r#"
            SELECT id, name, discount_amount, start_date, end_date
            FROM promotions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(promotion) = promotion else {
            return Ok(None);
        };

        let details = sqlx::query_as::<_, PromotionDetail>(
            r#"
            SELECT id, promotion_id, room_id, discount_percent
            FROM promotion_details
            WHERE promotion_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(Some(PromotionWithDetails { promotion, details }))
    }

    async fn write_promotion_details(
        tx: &mut Transaction<'_, Postgres>,
        promotion_id: i32,
        details: Vec<(i32, Decimal)>,
    ) -> Result<()> {
        sqlx::query("DELETE FROM promotion_details WHERE promotion_id = $1")
            .bind(promotion_id)
            .execute(&mut **tx)
            .await?;

        for (room_id, discount_percent) in details {
            sqlx::query(
                r#"
                INSERT INTO promotion_details (promotion_id, room_id, discount_percent)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(promotion_id)
            .bind(room_id)
            .bind(discount_percent)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn fetch_service(
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> Result<Option<ServiceWithRooms>> {
        let service = sqlx::query_as::<_, Service>(
            "SELECT id, name, price, unit, description FROM services WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(service) = service else {
            return Ok(None);
        };

        let room_ids = sqlx::query_scalar::<_, i32>(
            "SELECT room_id FROM service_details WHERE service_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(Some(ServiceWithRooms { service, room_ids }))
    }

    async fn bind_service(
        tx: &mut Transaction<'_, Postgres>,
        service_id: i32,
        room_ids: &[i32],
    ) -> Result<()> {
        sqlx::query("DELETE FROM service_details WHERE service_id = $1")
            .bind(service_id)
            .execute(&mut **tx)
            .await?;

        for room_id in room_ids {
            sqlx::query("INSERT INTO service_details (room_id, service_id) VALUES ($1, $2)")
                .bind(room_id)
                .bind(service_id)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    async fn attach_images(
        tx: &mut Transaction<'_, Postgres>,
        room_id: i32,
        paths: &[String],
    ) -> Result<()> {
        for path in clean_paths(paths) {
            sqlx::query(
                r#"
                INSERT INTO room_images (room_id, image_path)
                SELECT $1, $2
                WHERE NOT EXISTS (
                    SELECT 1 FROM room_images WHERE room_id = $1 AND image_path = $2
                )
                "#,
            )
            .bind(room_id)
            .bind(&path)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn find_candidates(&self, filters: &RoomFilters) -> Result<Vec<CandidateRow>> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT
                hd.id AS hotel_detail_id,
                h.id AS hotel_id,
                h.name AS hotel_name,
                hd.room_count,
                hd.status AS detail_status,
                r.id AS room_id,
                r.name AS room_name,
                r.description,
                r.size,
                r.price,
                r.bed_count
            FROM hotel_details hd
            JOIN hotels h ON h.id = hd.hotel_id
            JOIN rooms r ON r.id = hd.room_id
            WHERE ($1::TEXT IS NULL OR strpos(lower(h.name), $1) > 0)
              AND ($2::TEXT IS NULL OR strpos(lower(r.name), $2) > 0)
              AND ($3::INT4 IS NULL OR r.bed_count <= $3)
              AND ($4::FLOAT8 IS NULL OR r.size >= $4)
              AND ($5::FLOAT8 IS NULL OR r.size <= $5)
              AND ($6::NUMERIC IS NULL OR r.price <= $6)
            ORDER BY r.id, hd.id
            "#,
        )
        .bind(filters.hotel_name_needle())
        .bind(filters.room_name_needle())
        .bind(filters.max_bed_count)
        .bind(filters.min_size)
        .bind(filters.max_size)
        .bind(filters.max_price)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn booked_quantities(
        &self,
        hotel_detail_ids: &[i32],
        stay: &StayRange,
    ) -> Result<HashMap<i32, i64>> {
        let rows = sqlx::query_as::<_, (i32, i64)>(
            r#"
            SELECT rd.hotel_detail_id, SUM(rd.quantity)::BIGINT AS booked
            FROM room_details rd
            JOIN bookings b ON b.id = rd.booking_id
            WHERE rd.hotel_detail_id = ANY($1)
              AND b.status <> 'cancelled'
              AND b.check_in < $3
              AND b.check_out > $2
            GROUP BY rd.hotel_detail_id
            "#,
        )
        .bind(hotel_detail_ids)
        .bind(stay.check_in)
        .bind(stay.check_out)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn get_rooms(&self, room_ids: &[i32]) -> Result<HashMap<i32, Room>> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, name, description, size, price, bed_count
            FROM rooms
            WHERE id = ANY($1)
            "#,
        )
        .bind(room_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms.into_iter().map(|r| (r.id, r)).collect())
    }

    async fn room_images(&self, room_ids: &[i32]) -> Result<HashMap<i32, Vec<String>>> {
        let rows = sqlx::query_as::<_, (i32, String)>(
            r#"
            SELECT room_id, image_path
            FROM room_images
            WHERE room_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(room_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut images: HashMap<i32, Vec<String>> = HashMap::new();
        for (room_id, path) in rows {
            images.entry(room_id).or_default().push(path);
        }
        Ok(images)
    }

    async fn room_services(&self, room_ids: &[i32]) -> Result<HashMap<i32, Vec<String>>> {
        let rows = sqlx::query_as::<_, (i32, String)>(
            r#"
            SELECT DISTINCT sd.room_id, s.name
            FROM service_details sd
            JOIN services s ON s.id = sd.service_id
            WHERE sd.room_id = ANY($1)
              AND btrim(s.name) <> ''
            ORDER BY sd.room_id, s.name
            "#,
        )
        .bind(room_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut services: HashMap<i32, Vec<String>> = HashMap::new();
        for (room_id, name) in rows {
            services.entry(room_id).or_default().push(name);
        }
        Ok(services)
    }

    async fn active_promotions(
        &self,
        room_ids: &[i32],
        as_of: NaiveDate,
    ) -> Result<Vec<ActivePromotion>> {
        let promotions = sqlx::query_as::<_, ActivePromotion>(
            r#"
            SELECT
                p.id AS promotion_id,
                pd.room_id,
                p.name,
                p.discount_amount,
                pd.discount_percent
            FROM promotion_details pd
            JOIN promotions p ON p.id = pd.promotion_id
            WHERE pd.room_id = ANY($1)
              AND p.start_date <= $2
              AND p.end_date >= $2
            "#,
        )
        .bind(room_ids)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        Ok(promotions)
    }

    async fn get_hotel_details(&self, ids: &[i32]) -> Result<HashMap<i32, HotelDetail>> {
        let details = sqlx::query_as::<_, HotelDetail>(
            r#"
            SELECT id, hotel_id, room_id, room_count, status
            FROM hotel_details
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(details.into_iter().map(|d| (d.id, d)).collect())
    }

    async fn get_hotels(&self, ids: &[i32]) -> Result<HashMap<i32, Hotel>> {
        let hotels = sqlx::query_as::<_, Hotel>(
            r#"
            SELECT id, name, address, description, phone_number, status, manager_id
            FROM hotels
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(hotels.into_iter().map(|h| (h.id, h)).collect())
    }

    async fn insert_booking(
        &self,
        booking: NewBooking,
        lines: Vec<NewRoomDetail>,
    ) -> Result<Booking> {
        let mut tx = self.pool.begin().await?;

        // Locks taken in hotel detail id order
        for (hd_id, requested) in demand_by_detail(&lines) {
            let room_count = sqlx::query_scalar::<_, i32>(
                "SELECT room_count FROM hotel_details WHERE id = $1 FOR UPDATE",
            )
            .bind(hd_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| missing("HotelDetail", hd_id))?;

            let booked = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COALESCE(SUM(rd.quantity), 0)::BIGINT
                FROM room_details rd
                JOIN bookings b ON b.id = rd.booking_id
                WHERE rd.hotel_detail_id = $1
                  AND b.status <> 'cancelled'
                  AND b.check_in < $3
                  AND b.check_out > $2
                "#,
            )
            .bind(hd_id)
            .bind(booking.stay.check_in)
            .bind(booking.stay.check_out)
            .fetch_one(&mut *tx)
            .await?;

            ensure_capacity(hd_id, room_count, booked, requested)?;
        }

        let row = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                user_id, room_id, full_name, email, phone, additional_request,
                booking_date, check_in, check_out, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING
                id, user_id, room_id, full_name, email, phone, additional_request,
                booking_date, check_in, check_out, status
            "#,
        )
        .bind(booking.user_id)
        .bind(booking.room_id)
        .bind(&booking.contact.full_name)
        .bind(&booking.contact.email)
        .bind(&booking.contact.phone)
        .bind(&booking.contact.additional_request)
        .bind(booking.booking_date)
        .bind(booking.stay.check_in)
        .bind(booking.stay.check_out)
        .bind(booking.status)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO room_details (
                    booking_id, room_id, hotel_detail_id, quantity, adult_count, children_count
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(row.id)
            .bind(line.room_id)
            .bind(line.hotel_detail_id)
            .bind(line.quantity)
            .bind(line.adult_count)
            .bind(line.children_count)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(row)
    }

    async fn get_booking(&self, id: i32) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT
                id, user_id, room_id, full_name, email, phone, additional_request,
                booking_date, check_in, check_out, status
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn room_details(&self, booking_id: i32) -> Result<Vec<RoomDetail>> {
        let details = sqlx::query_as::<_, RoomDetail>(
            r#"
            SELECT
                id, booking_id, room_id, hotel_detail_id, quantity, adult_count, children_count,
                consumed
            FROM room_details
            WHERE booking_id = $1
            ORDER BY id
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    async fn bookings_for_user(&self, user_id: i32) -> Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT
                id, user_id, room_id, full_name, email, phone, additional_request,
                booking_date, check_in, check_out, status
            FROM bookings
            WHERE user_id = $1
            ORDER BY booking_date DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn update_contact(&self, booking_id: i32, contact: &GuestContact) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE bookings
            SET full_name = $2, email = $3, phone = $4, additional_request = $5
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .bind(&contact.full_name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.additional_request)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(missing("Booking", booking_id));
        }
        Ok(())
    }

    async fn transition_status(
        &self,
        booking_id: i32,
        from: BookingStatus,
        to: BookingStatus,
        effect: CapacityEffect,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2")
            .bind(booking_id)
            .bind(from)
            .bind(to)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if effect != CapacityEffect::None {
            // (line id, hotel detail id, quantity, consumed), in lock order
            let lines = sqlx::query_as::<_, (i32, i32, i32, i32)>(
                r#"
                SELECT id, hotel_detail_id, quantity, consumed
                FROM room_details
                WHERE booking_id = $1 AND hotel_detail_id IS NOT NULL
                ORDER BY hotel_detail_id, id
                "#,
            )
            .bind(booking_id)
            .fetch_all(&mut *tx)
            .await?;

            for (line_id, hd_id, quantity, consumed) in lines {
                let room_count = sqlx::query_scalar::<_, i32>(
                    "SELECT room_count FROM hotel_details WHERE id = $1 FOR UPDATE",
                )
                .bind(hd_id)
                .fetch_optional(&mut *tx)
                .await?;

                let Some(room_count) = room_count else {
                    continue;
                };

                let adjusted = effect.apply(room_count, quantity, consumed);
                if adjusted.clamped {
                    warn!(
                        booking_id,
                        hotel_detail_id = hd_id,
                        room_count,
                        quantity,
                        consumed = adjusted.consumed,
                        "Capacity consumption clamped at zero"
                    );
                }

                sqlx::query("UPDATE hotel_details SET room_count = $2 WHERE id = $1")
                    .bind(hd_id)
                    .bind(adjusted.room_count)
                    .execute(&mut *tx)
                    .await?;

                sqlx::query("UPDATE room_details SET consumed = $2 WHERE id = $1")
                    .bind(line_id)
                    .bind(adjusted.consumed)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_booking(&self, id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM room_details WHERE booking_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn insert_hotel(&self, input: HotelInput) -> Result<Hotel> {
        let hotel = sqlx::query_as::<_, Hotel>(
            r#"
            INSERT INTO hotels (name, address, description, phone_number, status, manager_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, address, description, phone_number, status, manager_id
            "#,
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.description)
        .bind(&input.phone_number)
        .bind(input.status)
        .bind(input.manager_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(hotel)
    }

    async fn update_hotel(&self, id: i32, input: HotelInput) -> Result<Option<Hotel>> {
        let hotel = sqlx::query_as::<_, Hotel>(
            r#"
            UPDATE hotels
            SET name = $2, address = $3, description = $4, phone_number = $5,
                status = $6, manager_id = $7
            WHERE id = $1
            RETURNING id, name, address, description, phone_number, status, manager_id
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.description)
        .bind(&input.phone_number)
        .bind(input.status)
        .bind(input.manager_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(hotel)
    }

    async fn delete_hotel(&self, id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM hotel_details WHERE hotel_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM hotels WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn hotel_details_for_hotel(&self, hotel_id: i32) -> Result<Vec<HotelDetail>> {
        let details = sqlx::query_as::<_, HotelDetail>(
            r#"
            SELECT id, hotel_id, room_id, room_count, status
            FROM hotel_details
            WHERE hotel_id = $1
            ORDER BY id
            "#,
        )
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    async fn replace_hotel_details(
        &self,
        hotel_id: i32,
        details: Vec<HotelDetailInput>,
    ) -> Result<Vec<HotelDetail>> {
        let mut tx = self.pool.begin().await?;

        let hotel = sqlx::query_scalar::<_, i32>("SELECT id FROM hotels WHERE id = $1 FOR UPDATE")
            .bind(hotel_id)
            .fetch_optional(&mut *tx)
            .await?;
        if hotel.is_none() {
            return Err(missing("Hotel", hotel_id));
        }

        let room_ids: Vec<i32> = details.iter().map(|d| d.room_id).collect();
        let known = sqlx::query_scalar::<_, i32>("SELECT id FROM rooms WHERE id = ANY($1)")
            .bind(&room_ids)
            .fetch_all(&mut *tx)
            .await?;
        if let Some(unknown) = room_ids.iter().find(|id| !known.contains(id)) {
            return Err(missing("Room", *unknown));
        }

        sqlx::query("DELETE FROM hotel_details WHERE hotel_id = $1 AND NOT (room_id = ANY($2))")
            .bind(hotel_id)
            .bind(&room_ids)
            .execute(&mut *tx)
            .await?;

        let mut written = Vec::with_capacity(details.len());
        for input in &details {
            let detail = sqlx::query_as::<_, HotelDetail>(
                r#"
                INSERT INTO hotel_details (hotel_id, room_id, room_count, status)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (hotel_id, room_id)
                DO UPDATE SET room_count = EXCLUDED.room_count, status = EXCLUDED.status
                RETURNING id, hotel_id, room_id, room_count, status
                "#,
            )
            .bind(hotel_id)
            .bind(input.room_id)
            .bind(input.room_count)
            .bind(input.status)
            .fetch_one(&mut *tx)
            .await?;
            written.push(detail);
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn insert_promotion(
        &self,
        input: &PromotionInput,
        details: Vec<(i32, Decimal)>,
    ) -> Result<PromotionWithDetails> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO promotions (name, discount_amount, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(input.discount_amount)
        .bind(input.start_date)
        .bind(input.end_date)
        .fetch_one(&mut *tx)
        .await?;

        Self::write_promotion_details(&mut tx, id, details).await?;
        let written = Self::fetch_promotion(&mut tx, id)
            .await?
            .ok_or_else(|| missing("Promotion", id))?;

        tx.commit().await?;
        Ok(written)
    }

    async fn update_promotion(
        &self,
        id: i32,
        input: &PromotionInput,
        details: Vec<(i32, Decimal)>,
    ) -> Result<Option<PromotionWithDetails>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE promotions
            SET name = $2, discount_amount = $3, start_date = $4, end_date = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.discount_amount)
        .bind(input.start_date)
        .bind(input.end_date)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        Self::write_promotion_details(&mut tx, id, details).await?;
        let written = Self::fetch_promotion(&mut tx, id).await?;

        tx.commit().await?;
        Ok(written)
    }

    async fn delete_promotion(&self, id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM promotion_details WHERE promotion_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM promotions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_promotions(&self) -> Result<Vec<PromotionWithDetails>> {
        let promotions = sqlx::query_as::<_, Promotion>(
            r#"
            SELECT id, name, discount_amount, start_date, end_date
            FROM promotions
            ORDER BY start_date DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let details = sqlx::query_as::<_, PromotionDetail>(
            r#"
            SELECT id, promotion_id, room_id, discount_percent
            FROM promotion_details
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_promotion: HashMap<i32, Vec<PromotionDetail>> = HashMap::new();
        for detail in details {
            by_promotion.entry(detail.promotion_id).or_default().push(detail);
        }

        Ok(promotions
            .into_iter()
            .map(|promotion| {
                let details = by_promotion.remove(&promotion.id).unwrap_or_default();
                PromotionWithDetails { promotion, details }
            })
            .collect())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>(
            "SELECT id, name, description, size, price, bed_count FROM rooms ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rooms)
    }

    async fn insert_room(&self, input: &RoomInput) -> Result<Room> {
        let mut tx = self.pool.begin().await?;

        let room = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (name, description, size, price, bed_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, size, price, bed_count
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.size)
        .bind(input.price)
        .bind(input.bed_count)
        .fetch_one(&mut *tx)
        .await?;

        Self::attach_images(&mut tx, room.id, &input.image_paths).await?;

        tx.commit().await?;
        Ok(room)
    }

    async fn update_room(&self, id: i32, input: &RoomInput) -> Result<Option<Room>> {
        let mut tx = self.pool.begin().await?;

        let room = sqlx::query_as::<_, Room>(
            r#"
            UPDATE rooms
            SET name = $2, description = $3, size = $4, price = $5, bed_count = $6
            WHERE id = $1
            RETURNING id, name, description, size, price, bed_count
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.size)
        .bind(input.price)
        .bind(input.bed_count)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(room) = room else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM room_images WHERE room_id = $1 AND image_path = ANY($2)")
            .bind(id)
            .bind(clean_paths(&input.remove_image_paths))
            .execute(&mut *tx)
            .await?;
        Self::attach_images(&mut tx, id, &input.image_paths).await?;

        tx.commit().await?;
        Ok(Some(room))
    }

    async fn delete_room(&self, id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let room = sqlx::query_scalar::<_, i32>("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if room.is_none() {
            return Ok(false);
        }

        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM bookings WHERE room_id = $1)
                OR EXISTS (SELECT 1 FROM room_details WHERE room_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if referenced {
            return Err(AppError::Conflict(format!(
                "room {} is referenced by bookings",
                id
            )));
        }

        // Images, service bindings, capacity records and promotion details cascade
        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn list_services(&self) -> Result<Vec<ServiceWithRooms>> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT id, name, price, unit, description FROM services ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let bindings = sqlx::query_as::<_, (i32, i32)>(
            "SELECT service_id, room_id FROM service_details ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_service: HashMap<i32, Vec<i32>> = HashMap::new();
        for (service_id, room_id) in bindings {
            by_service.entry(service_id).or_default().push(room_id);
        }

        Ok(services
            .into_iter()
            .map(|service| {
                let room_ids = by_service.remove(&service.id).unwrap_or_default();
                ServiceWithRooms { service, room_ids }
            })
            .collect())
    }

    async fn insert_service(
        &self,
        input: &ServiceInput,
        room_ids: &[i32],
    ) -> Result<ServiceWithRooms> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO services (name, price, unit, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(&input.unit)
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await?;

        Self::bind_service(&mut tx, id, room_ids).await?;
        let written = Self::fetch_service(&mut tx, id)
            .await?
            .ok_or_else(|| missing("Service", id))?;

        tx.commit().await?;
        Ok(written)
    }

    async fn update_service(
        &self,
        id: i32,
        input: &ServiceInput,
        room_ids: &[i32],
    ) -> Result<Option<ServiceWithRooms>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE services
            SET name = $2, price = $3, unit = $4, description = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.price)
        .bind(&input.unit)
        .bind(&input.description)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        Self::bind_service(&mut tx, id, room_ids).await?;
        let written = Self::fetch_service(&mut tx, id).await?;

        tx.commit().await?;
        Ok(written)
    }

    async fn delete_service(&self, id: i32) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn report_lines(&self, from: NaiveDate, until: NaiveDate) -> Result<Vec<ReportLine>> {
        let lines = sqlx::query_as::<_, ReportLine>(
            r#"
            SELECT
                b.booking_date,
                r.name AS room_name,
                h.name AS hotel_name,
                rd.quantity,
                r.price
            FROM room_details rd
            JOIN bookings b ON b.id = rd.booking_id
            JOIN rooms r ON r.id = rd.room_id
            LEFT JOIN hotel_details hd ON hd.id = rd.hotel_detail_id
            LEFT JOIN hotels h ON h.id = hd.hotel_id
            WHERE b.status <> 'cancelled'
              AND b.booking_date >= $1
              AND b.booking_date < $2
            ORDER BY b.booking_date, rd.id
            "#,
        )
        .bind(day_start(from))
        .bind(day_start(until))
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }
}
