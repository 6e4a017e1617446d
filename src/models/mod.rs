//! Inventory entities and the row shapes used to write them.
//!
//! Entities are flat rows keyed by integer id; relationships are resolved by
//! lookup on the foreign-key fields rather than through embedded object graphs.

pub mod booking;
pub mod hotel;
pub mod promotion;
pub mod room;
pub mod service;

pub use booking::{
    Booking, BookingStatus, GuestContact, NewBooking, NewRoomDetail, ReportLine, RoomDetail,
    StayRange,
};
pub use hotel::{
    CapacityAdjustment, CapacityEffect, Hotel, HotelDetail, HotelDetailInput, HotelInput, HotelStatus,
    RoomStatus,
};
pub use promotion::{ActivePromotion, Promotion, PromotionDetail, PromotionInput};
pub use room::{CandidateRow, Room, RoomFilters, RoomInput, RoomMedia};
pub use service::{Service, ServiceInput, ServiceWithRooms};
