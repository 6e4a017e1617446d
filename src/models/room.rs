//! Room type models and search predicates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::hotel::RoomStatus;

/// Room type from rooms. Price and description are hotel-independent.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub size: f64,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub bed_count: i32,
}

/// Room type fields written by the admin, with image edits
#[derive(Debug, Clone, Deserialize)]
pub struct RoomInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub size: f64,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub bed_count: i32,
    /// Image paths to attach
    #[serde(default)]
    pub image_paths: Vec<String>,
    /// Attached image paths to drop
    #[serde(default)]
    pub remove_image_paths: Vec<String>,
}

/// Non-date search predicates over hotel x room
#[derive(Debug, Clone, Default)]
pub struct RoomFilters {
    pub hotel_name: Option<String>,
    pub room_name: Option<String>,
    pub max_bed_count: Option<i32>,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub max_price: Option<Decimal>,
}

impl RoomFilters {
    /// Trimmed, lowercased substring needles; blank input means "no filter".
    fn needle(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn hotel_name_needle(&self) -> Option<String> {
        Self::needle(&self.hotel_name)
    }

    pub fn room_name_needle(&self) -> Option<String> {
        Self::needle(&self.room_name)
    }

    /// Check a hotel/room pair against every predicate (bounds inclusive)
    pub fn matches(&self, hotel_name: &str, room: &Room) -> bool {
        if let Some(needle) = self.hotel_name_needle() {
            if !hotel_name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if let Some(needle) = self.room_name_needle() {
            if !room.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if self.max_bed_count.is_some_and(|max| room.bed_count > max) {
            return false;
        }
        if self.min_size.is_some_and(|min| room.size < min) {
            return false;
        }
        if self.max_size.is_some_and(|max| room.size > max) {
            return false;
        }
        if self.max_price.is_some_and(|max| room.price > max) {
            return false;
        }
        true
    }
}

/// Hotel detail joined with its hotel name and room, as returned by the
/// candidate query of the availability search
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub hotel_detail_id: i32,
    pub hotel_id: i32,
    pub hotel_name: String,
    pub room_count: i32,
    pub detail_status: RoomStatus,
    pub room_id: i32,
    pub room_name: String,
    pub description: String,
    pub size: f64,
    pub price: Decimal,
    pub bed_count: i32,
}

impl CandidateRow {
    pub fn room(&self) -> Room {
        Room {
            id: self.room_id,
            name: self.room_name.clone(),
            description: self.description.clone(),
            size: self.size,
            price: self.price,
            bed_count: self.bed_count,
        }
    }
}

/// Informational attachments of a room: media paths and service names
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoomMedia {
    pub image_paths: Vec<String>,
    pub services: Vec<String>,
}
