//! Core pricing calculation functions.
//!
//! Pure functions for room pricing math - no database access.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::models::{ActivePromotion, Room};

use super::models::{PriceResolution, PricingPolicy};

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use hotel_booking::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Discount percent stored on a promotion detail.
///
/// `round(amount / price * 100, 2)` clamped to [0, 100]; 0 when the room
/// price is not positive.
pub fn discount_percent(discount_amount: Decimal, room_price: Decimal) -> Decimal {
    if room_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut percent = round_money(discount_amount / room_price * Decimal::ONE_HUNDRED, 2)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    percent.rescale(2);
    percent
}

/// Nightly price after the promotion.
///
/// A positive percent wins; otherwise a positive absolute amount is taken off
/// (floored at zero). Not rounded.
pub fn effective_unit_price(unit_price: Decimal, promotion: Option<&ActivePromotion>) -> Decimal {
    let Some(promotion) = promotion else {
        return unit_price;
    };

    if promotion.discount_percent > Decimal::ZERO {
        unit_price * (Decimal::ONE_HUNDRED - promotion.discount_percent) / Decimal::ONE_HUNDRED
    } else if promotion.discount_amount > Decimal::ZERO {
        (unit_price - promotion.discount_amount).max(Decimal::ZERO)
    } else {
        unit_price
    }
}

/// Surcharge for adults beyond the free threshold:
/// `max(0, adults - free) * fee * quantity * nights`
pub fn extra_guest_charge(
    policy: &PricingPolicy,
    adult_count: i32,
    quantity: i32,
    nights: i64,
) -> Decimal {
    let extra_adults = (adult_count - policy.free_adults_per_room).max(0);
    if extra_adults == 0 || quantity <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(extra_adults)
        * policy.extra_adult_fee
        * Decimal::from(quantity)
        * Decimal::from(nights)
}

/// Price one room selection over a stay.
///
/// `subtotal = effective_unit_price * quantity * nights + extra_charge`,
/// rounded to whole currency units only here.
pub fn resolve_price(
    policy: &PricingPolicy,
    room: &Room,
    adult_count: i32,
    quantity: i32,
    nights: i64,
    promotion: Option<&ActivePromotion>,
) -> PriceResolution {
    let unit_price = room.price;
    let effective = effective_unit_price(unit_price, promotion);
    let extra_charge = extra_guest_charge(policy, adult_count, quantity, nights);
    let subtotal =
        effective * Decimal::from(quantity) * Decimal::from(nights) + extra_charge;

    PriceResolution {
        unit_price,
        effective_unit_price: effective,
        extra_charge,
        subtotal: round_money(subtotal, 0),
        promotion: promotion.cloned(),
    }
}

/// Booking total over priced lines, in whole currency units
pub fn stay_total<'a>(lines: impl IntoIterator<Item = &'a PriceResolution>) -> Decimal {
    round_money(lines.into_iter().map(|line| line.subtotal).sum(), 0)
}

/// Deposit share of a total (half, whole currency units)
pub fn deposit_amount(total: Decimal) -> Decimal {
    round_money(total / Decimal::TWO, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn room(price: Decimal) -> Room {
        Room {
            id: 1,
            name: "Deluxe".to_string(),
            description: String::new(),
            size: 32.0,
            price,
            bed_count: 2,
        }
    }

    fn promotion(amount: Decimal, percent: Decimal) -> ActivePromotion {
        ActivePromotion {
            promotion_id: 1,
            room_id: 1,
            name: "Summer".to_string(),
            discount_amount: amount,
            discount_percent: percent,
        }
    }

    // ==================== round_money tests ====================

    #[test]
    fn test_round_money_bankers_rounding_to_even() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(2));
        assert_eq!(round_money(dec!(3.5), 0), dec!(4));
        assert_eq!(round_money(dec!(2.45), 1), dec!(2.4));
    }

    #[test]
    fn test_round_money_normal_rounding() {
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(1.236), 2), dec!(1.24));
        assert_eq!(round_money(dec!(999999.995), 2), dec!(1000000.00));
    }

    // ==================== discount_percent tests ====================

    #[test]
    fn test_discount_percent_from_amount() {
        assert_eq!(discount_percent(dec!(100000), dec!(1000000)), dec!(10.00));
        assert_eq!(discount_percent(dec!(100000), dec!(1000000)).to_string(), "10.00");
        assert_eq!(discount_percent(dec!(1), dec!(3)), dec!(33.33));
    }

    #[test]
    fn test_discount_percent_clamped() {
        assert_eq!(discount_percent(dec!(2000000), dec!(1000000)), dec!(100));
        assert_eq!(discount_percent(dec!(-5), dec!(100)), dec!(0));
    }

    #[test]
    fn test_discount_percent_non_positive_price() {
        assert_eq!(discount_percent(dec!(100), dec!(0)), dec!(0));
        assert_eq!(discount_percent(dec!(100), dec!(-1)), dec!(0));
    }

    // ==================== effective_unit_price tests ====================

    #[test]
    fn test_effective_price_percent_takes_precedence() {
        let promo = promotion(dec!(500000), dec!(10));
        assert_eq!(effective_unit_price(dec!(1000000), Some(&promo)), dec!(900000));
    }

    #[test]
    fn test_effective_price_amount_only() {
        let promo = promotion(dec!(150000), dec!(0));
        assert_eq!(effective_unit_price(dec!(1000000), Some(&promo)), dec!(850000));

        let oversized = promotion(dec!(2000000), dec!(0));
        assert_eq!(effective_unit_price(dec!(1000000), Some(&oversized)), dec!(0));
    }

    #[test]
    fn test_effective_price_without_promotion() {
        assert_eq!(effective_unit_price(dec!(1000000), None), dec!(1000000));
        let empty = promotion(dec!(0), dec!(0));
        assert_eq!(effective_unit_price(dec!(1000000), Some(&empty)), dec!(1000000));
    }

    // ==================== extra_guest_charge tests ====================

    #[test]
    fn test_extra_guest_charge_below_threshold() {
        let policy = PricingPolicy::default();
        assert_eq!(extra_guest_charge(&policy, 2, 1, 2), dec!(0));
        assert_eq!(extra_guest_charge(&policy, 3, 4, 7), dec!(0));
    }

    #[test]
    fn test_extra_guest_charge_scales_with_quantity_and_nights() {
        let policy = PricingPolicy::default();
        // 2 extra adults * 100000 * 3 rooms * 2 nights
        assert_eq!(extra_guest_charge(&policy, 5, 3, 2), dec!(1200000));
    }

    // ==================== resolve_price tests ====================

    #[test]
    fn test_resolve_price_promotion_no_surcharge() {
        let policy = PricingPolicy::default();
        let promo = promotion(dec!(100000), discount_percent(dec!(100000), dec!(1000000)));

        let price = resolve_price(&policy, &room(dec!(1000000)), 2, 1, 2, Some(&promo));

        assert_eq!(price.unit_price, dec!(1000000));
        assert_eq!(price.effective_unit_price, dec!(900000));
        assert_eq!(price.extra_charge, dec!(0));
        assert_eq!(price.subtotal, dec!(1800000));
        assert_eq!(price.promotion, Some(promo));
    }

    #[test]
    fn test_resolve_price_with_surcharge() {
        let policy = PricingPolicy::default();
        let promo = promotion(dec!(100000), dec!(10.00));

        let price = resolve_price(&policy, &room(dec!(1000000)), 5, 1, 2, Some(&promo));

        assert_eq!(price.extra_charge, dec!(400000));
        assert_eq!(price.subtotal, dec!(2200000));
    }

    #[test]
    fn test_resolve_price_rounds_subtotal_only() {
        let policy = PricingPolicy::default();
        let promo = promotion(dec!(0), dec!(33.33));

        // 100001 * 0.6667 = 66670.6667 per night; two nights
        let price = resolve_price(&policy, &room(dec!(100001)), 1, 1, 2, Some(&promo));

        assert_eq!(price.effective_unit_price, dec!(66670.666700));
        assert_eq!(price.subtotal, dec!(133341));
    }

    // ==================== totals tests ====================

    #[test]
    fn test_stay_total_and_deposit() {
        let policy = PricingPolicy::default();
        let a = resolve_price(&policy, &room(dec!(1000000)), 2, 1, 2, None);
        let b = resolve_price(&policy, &room(dec!(500001)), 2, 1, 1, None);

        let total = stay_total([&a, &b]);
        assert_eq!(total, dec!(2500001));
        // 1250000.5 rounds to even
        assert_eq!(deposit_amount(total), dec!(1250000));
    }
}
