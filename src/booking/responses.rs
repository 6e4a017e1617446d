//! Response DTOs for booking endpoints.

use serde::Serialize;

use crate::models::{Booking, BookingStatus};
use crate::pricing::{MoneyResponse, PriceResolution};

use super::lifecycle::PaymentKind;

/// A booking line with its price
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    pub room_detail_id: i32,
    pub room_id: i32,
    pub room_name: String,
    pub hotel_detail_id: Option<i32>,
    pub hotel_name: Option<String>,
    pub hotel_address: Option<String>,
    pub quantity: i32,
    pub adult_count: i32,
    pub children_count: i32,
    #[serde(flatten)]
    pub price: PriceResolution,
}

/// Booking with priced lines and amounts
#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    pub booking: Booking,
    pub nights: i64,
    pub lines: Vec<PricedLine>,
    pub total: MoneyResponse,
    pub deposit: MoneyResponse,
    pub due: MoneyResponse,
}

/// Amount still owed on a booking
#[derive(Debug, Clone, Serialize)]
pub struct DueResponse {
    pub booking_id: i32,
    pub status: BookingStatus,
    pub total: MoneyResponse,
    pub due: MoneyResponse,
}

/// Amount to charge for a payment of the given kind
#[derive(Debug, Clone, Serialize)]
pub struct PaymentAmountResponse {
    pub booking_id: i32,
    pub kind: PaymentKind,
    pub amount: MoneyResponse,
}
