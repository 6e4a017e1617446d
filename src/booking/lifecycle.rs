//! Booking status machine.
//!
//! ```text
//! Pending   -> Confirmed | Deposited | Paid | Cancelled
//! Confirmed -> Deposited | Paid | Cancelled
//! Deposited -> Paid | Cancelled
//! Paid      -> Completed | Cancelled
//! ```
//!
//! Deposited and Paid bookings hold hotel capacity. Entering either from a
//! non-holding state consumes it; cancelling a holding booking releases it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{BookingStatus, CapacityEffect};
use crate::pricing::deposit_amount;

/// Kind of payment reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Deposit,
    #[serde(alias = "paid")]
    Full,
}

impl PaymentKind {
    /// Status a successful payment of this kind leads to
    pub fn target(self) -> BookingStatus {
        match self {
            PaymentKind::Deposit => BookingStatus::Deposited,
            PaymentKind::Full => BookingStatus::Paid,
        }
    }
}

pub fn is_terminal(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Completed | BookingStatus::Cancelled)
}

/// Whether a booking in this status has consumed hotel capacity
pub fn holds_capacity(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Deposited | BookingStatus::Paid)
}

pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;

    matches!(
        (from, to),
        (Pending, Confirmed | Deposited | Paid | Cancelled)
            | (Confirmed, Deposited | Paid | Cancelled)
            | (Deposited, Paid | Cancelled)
            | (Paid, Completed | Cancelled)
    )
}

/// Capacity adjustment that accompanies a transition
pub fn capacity_effect(from: BookingStatus, to: BookingStatus) -> CapacityEffect {
    if !holds_capacity(from) && holds_capacity(to) {
        CapacityEffect::Consume
    } else if holds_capacity(from) && to == BookingStatus::Cancelled {
        CapacityEffect::Release
    } else {
        CapacityEffect::None
    }
}

fn illegal(from: BookingStatus, to: BookingStatus) -> AppError {
    AppError::Conflict(format!("cannot move booking from {:?} to {:?}", from, to))
}

/// Next status for a confirmed payment, or `None` when the payment changes
/// nothing (a repeated callback, or a deposit on a fully paid booking).
pub fn plan_payment(current: BookingStatus, kind: PaymentKind) -> Result<Option<BookingStatus>> {
    let target = kind.target();
    if current == target || current == BookingStatus::Paid {
        return Ok(None);
    }
    if !can_transition(current, target) {
        return Err(illegal(current, target));
    }
    Ok(Some(target))
}

/// Cancellation is refused once a booking is completed or cancelled
pub fn plan_cancel(current: BookingStatus) -> Result<Option<BookingStatus>> {
    if is_terminal(current) {
        return Err(AppError::Conflict(format!(
            "booking is already {:?}",
            current
        )));
    }
    Ok(Some(BookingStatus::Cancelled))
}

/// Explicit status change; setting the current status again is a no-op
pub fn plan_status(current: BookingStatus, to: BookingStatus) -> Result<Option<BookingStatus>> {
    if current == to {
        return Ok(None);
    }
    if !can_transition(current, to) {
        return Err(illegal(current, to));
    }
    Ok(Some(to))
}

/// Amount still owed on a booking with the given total
pub fn amount_due(status: BookingStatus, total: Decimal) -> Decimal {
    match status {
        BookingStatus::Pending | BookingStatus::Confirmed => total,
        BookingStatus::Deposited => deposit_amount(total),
        BookingStatus::Paid | BookingStatus::Completed | BookingStatus::Cancelled => Decimal::ZERO,
    }
}
