//! Pricing inputs and results.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::models::ActivePromotion;

/// Extra-guest surcharge policy and display currency
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    /// Adults per room unit included in the base price
    pub free_adults_per_room: i32,
    /// Fee per adult beyond the free threshold, per room unit and night
    pub extra_adult_fee: Decimal,
    pub currency: String,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_adults_per_room: 3,
            extra_adult_fee: dec!(100000),
            currency: "VND".to_string(),
        }
    }
}

/// Priced booking line (or search quote)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceResolution {
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub effective_unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub extra_charge: Decimal,
    /// Rounded to whole currency units
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    pub promotion: Option<ActivePromotion>,
}
