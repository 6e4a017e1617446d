//! Best-promotion selection.
//!
//! The only place the promotion ordering lives: highest discount percent,
//! then highest discount amount, then lowest promotion id so the pick never
//! depends on row order.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::ActivePromotion;

fn rank(a: &ActivePromotion, b: &ActivePromotion) -> Ordering {
    a.discount_percent
        .cmp(&b.discount_percent)
        .then_with(|| a.discount_amount.cmp(&b.discount_amount))
        .then_with(|| b.promotion_id.cmp(&a.promotion_id))
}

/// Pick the best of a set of active promotions for one room
pub fn select_best<'a, I>(promotions: I) -> Option<&'a ActivePromotion>
where
    I: IntoIterator<Item = &'a ActivePromotion>,
{
    promotions.into_iter().max_by(|a, b| rank(a, b))
}

/// Best active promotion per room
pub fn best_by_room(promotions: Vec<ActivePromotion>) -> HashMap<i32, ActivePromotion> {
    let mut by_room: HashMap<i32, Vec<ActivePromotion>> = HashMap::new();
    for promotion in promotions {
        by_room.entry(promotion.room_id).or_default().push(promotion);
    }

    by_room
        .into_iter()
        .filter_map(|(room_id, candidates)| {
            select_best(&candidates).map(|best| (room_id, best.clone()))
        })
        .collect()
}
