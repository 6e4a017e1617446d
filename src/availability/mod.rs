//! Availability checker.
//!
//! Hotel-room combinations with remaining capacity for a set of search
//! filters and an optional stay, annotated with media and the best running
//! promotion.

pub mod requests;
pub mod responses;
pub mod services;

pub use requests::SearchQuery;
pub use responses::RoomAvailability;
pub use services::search;
