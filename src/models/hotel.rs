//! Hotel and hotel-room capacity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Operating status of a hotel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "hotel_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HotelStatus {
    Open,
    Closed,
    Maintenance,
}

/// Status of a room type at a specific hotel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "room_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Reserved,
    Occupied,
    Maintenance,
}

/// Hotel from hotels
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Hotel {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub description: Option<String>,
    pub phone_number: Option<String>,
    pub status: HotelStatus,
    pub manager_id: Option<i32>,
}

/// Capacity record binding a room type to a hotel (hotel_details)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HotelDetail {
    pub id: i32,
    pub hotel_id: i32,
    pub room_id: i32,
    pub room_count: i32,
    pub status: RoomStatus,
}

/// Fields written when creating or updating a hotel
#[derive(Debug, Clone, Deserialize)]
pub struct HotelInput {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default = "default_hotel_status")]
    pub status: HotelStatus,
    #[serde(default)]
    pub manager_id: Option<i32>,
}

fn default_hotel_status() -> HotelStatus {
    HotelStatus::Open
}

/// One entry of a hotel's replacement capacity set
#[derive(Debug, Clone, Deserialize)]
pub struct HotelDetailInput {
    pub room_id: i32,
    pub room_count: i32,
    #[serde(default = "default_room_status")]
    pub status: RoomStatus,
}

fn default_room_status() -> RoomStatus {
    RoomStatus::Available
}

/// How a status change moves hotel capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityEffect {
    /// Capacity is untouched
    None,
    /// Booked quantities are taken out of `room_count`
    Consume,
    /// Booked quantities are handed back to `room_count`
    Release,
}

/// Outcome of applying a capacity effect to one booking line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityAdjustment {
    /// New room count of the line's hotel detail
    pub room_count: i32,
    /// Units the line holds afterwards
    pub consumed: i32,
    /// True when consumption hit the zero floor
    pub clamped: bool,
}

impl CapacityEffect {
    /// Apply the effect to one booking line of `quantity` units that currently
    /// holds `consumed` of them.
    ///
    /// Consumption takes at most what is left, so the count never drops below
    /// zero, and records what it took. Release hands back exactly the recorded
    /// units.
    pub fn apply(self, room_count: i32, quantity: i32, consumed: i32) -> CapacityAdjustment {
        match self {
            CapacityEffect::None => CapacityAdjustment {
                room_count,
                consumed,
                clamped: false,
            },
            CapacityEffect::Consume => {
                let wanted = (quantity - consumed).max(0);
                let taken = wanted.min(room_count.max(0));
                CapacityAdjustment {
                    room_count: room_count - taken,
                    consumed: consumed + taken,
                    clamped: taken < wanted,
                }
            }
            CapacityEffect::Release => CapacityAdjustment {
                room_count: room_count.saturating_add(consumed),
                consumed: 0,
                clamped: false,
            },
        }
    }
}
