//! Request DTOs for booking endpoints.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::{BookingStatus, GuestContact};

use super::lifecycle::PaymentKind;

/// One room type picked from one hotel
#[derive(Debug, Clone, Deserialize)]
pub struct RoomSelection {
    pub room_id: i32,
    pub hotel_detail_id: i32,
    pub quantity: i32,
    #[serde(default = "default_adults")]
    pub adult_count: i32,
    #[serde(default)]
    pub children_count: i32,
}

fn default_adults() -> i32 {
    1
}

/// Request to create a booking
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub customer: GuestContact,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub selections: Vec<RoomSelection>,
    /// Initial status other than Pending; admin only
    #[serde(default)]
    pub status: Option<BookingStatus>,
}

/// Payment callback forwarded by the gateway integration
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub kind: PaymentKind,
}

/// Query of the payment amount endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentAmountQuery {
    pub kind: PaymentKind,
}

/// Admin status change
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}
