//! Promotion models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Promotion from promotions
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Promotion {
    pub id: i32,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Promotion {
    /// Check if the promotion runs on the given day (both ends inclusive)
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

/// Room binding of a promotion, from promotion_details
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromotionDetail {
    pub id: i32,
    pub promotion_id: i32,
    pub room_id: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_percent: Decimal,
}

/// A promotion detail joined with its promotion, for pricing
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ActivePromotion {
    pub promotion_id: i32,
    pub room_id: i32,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_percent: Decimal,
}

/// Promotion fields written by the admin
#[derive(Debug, Clone, Deserialize)]
pub struct PromotionInput {
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub room_ids: Vec<i32>,
}
