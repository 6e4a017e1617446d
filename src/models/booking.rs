//! Booking and booking line item models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, Result};

/// Booking status. Transition rules live in `booking::lifecycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Deposited,
    Paid,
    Confirmed,
    Completed,
    Cancelled,
}

/// Booking from bookings
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: i32,
    pub user_id: i32,
    /// Representative room of the booking (first selected room type)
    pub room_id: i32,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub additional_request: Option<String>,
    pub booking_date: DateTime<Utc>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub status: BookingStatus,
}

impl Booking {
    pub fn stay(&self) -> StayRange {
        StayRange {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }
}

/// Booking line item from room_details
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoomDetail {
    pub id: i32,
    pub booking_id: i32,
    pub room_id: i32,
    /// Capacity record the units were taken from; cleared if that record is removed
    pub hotel_detail_id: Option<i32>,
    pub quantity: i32,
    pub adult_count: i32,
    pub children_count: i32,
    /// Units currently taken out of the hotel detail's room count
    pub consumed: i32,
}

/// Guest contact fields of a booking
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuestContact {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub additional_request: Option<String>,
}

/// Booking row to insert
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i32,
    pub room_id: i32,
    pub contact: GuestContact,
    pub booking_date: DateTime<Utc>,
    pub stay: StayRange,
    pub status: BookingStatus,
}

/// Line item to insert alongside a new booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoomDetail {
    pub room_id: i32,
    pub hotel_detail_id: i32,
    pub quantity: i32,
    pub adult_count: i32,
    pub children_count: i32,
}

/// Booked line flattened for reporting
#[derive(Debug, Clone, FromRow)]
pub struct ReportLine {
    pub booking_date: DateTime<Utc>,
    pub room_name: String,
    /// None when the capacity record behind the line was removed
    pub hotel_name: Option<String>,
    pub quantity: i32,
    pub price: rust_decimal::Decimal,
}

/// Half-open stay interval `[check_in, check_out)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    /// Build a stay, rejecting ranges where check-out is not after check-in
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self> {
        if check_out <= check_in {
            return Err(AppError::Validation(format!(
                "check-out {} must be after check-in {}",
                check_out, check_in
            )));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Number of nights, never less than one
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(1)
    }

    /// Two stays overlap when they share at least one night
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        check_in < self.check_out && check_out > self.check_in
    }
}
