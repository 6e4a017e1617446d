//! Back-office operations on hotels, their room capacity, room types,
//! services, promotions and the booking report. All writes require the admin
//! role.

pub mod hotels;
pub mod promotions;
pub mod reports;
pub mod rooms;
pub mod services;
