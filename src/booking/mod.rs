//! Booking lifecycle manager.
//!
//! Creates bookings with room-detail line items, computes totals and dues,
//! and moves bookings through the status machine with the matching hotel
//! capacity adjustments.

pub mod lifecycle;
pub mod requests;
pub mod responses;
pub mod services;

pub use lifecycle::PaymentKind;
pub use requests::{CreateBookingRequest, RoomSelection};
pub use responses::{BookingSummary, DueResponse, PricedLine};
