//! Room service models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Service offered with rooms, from services
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Service {
    pub id: i32,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub unit: String,
    pub description: Option<String>,
}

/// A service together with the rooms it is bound to
#[derive(Debug, Clone, Serialize)]
pub struct ServiceWithRooms {
    #[serde(flatten)]
    pub service: Service,
    pub room_ids: Vec<i32>,
}

/// Service fields written by the admin. `room_ids` replaces the bindings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room_ids: Vec<i32>,
}
