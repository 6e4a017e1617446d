//! Response DTOs for the availability search.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::ActivePromotion;

/// One bookable hotel-room combination
#[derive(Debug, Clone, Serialize)]
pub struct RoomAvailability {
    pub hotel_detail_id: i32,
    pub hotel_id: i32,
    pub hotel_name: String,
    pub room_id: i32,
    pub room_name: String,
    pub description: String,
    pub size: f64,
    pub bed_count: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Nightly price after the promotion, before any surcharge
    #[serde(with = "rust_decimal::serde::str")]
    pub effective_price: Decimal,
    /// `room_count` minus rooms booked over the requested stay
    pub remaining_rooms: i64,
    pub image_paths: Vec<String>,
    pub services: Vec<String>,
    pub promotion: Option<ActivePromotion>,
}
