//! Pricing & promotion resolver.
//!
//! Nightly room prices, best active promotion per room and the extra-guest
//! surcharge. Calculators are pure; services read promotions from the store.

pub mod calculators;
pub mod models;
pub mod promotions;
pub mod responses;
pub mod services;

// Re-export commonly used items
pub use calculators::{deposit_amount, discount_percent, resolve_price, round_money, stay_total};
pub use models::{PriceResolution, PricingPolicy};
pub use promotions::{best_by_room, select_best};
pub use responses::MoneyResponse;
