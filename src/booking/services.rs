//! Booking lifecycle operations.
//!
//! Every operation takes the acting `Principal` explicitly. Status changes go
//! through `drive`, which compare-and-sets the stored status together with the
//! capacity effect of the transition, so a repeated payment callback finds the
//! booking already moved and changes nothing.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::auth::Principal;
use crate::db::InventoryStore;
use crate::error::{AppError, Result};
use crate::models::{
    Booking, BookingStatus, GuestContact, NewBooking, NewRoomDetail, RoomDetail, RoomStatus,
    StayRange,
};
use crate::pricing::services::active_promotions_by_room;
use crate::pricing::{
    deposit_amount, resolve_price, round_money, stay_total, MoneyResponse, PricingPolicy,
};

use super::lifecycle::{self, PaymentKind};
use super::requests::{CreateBookingRequest, RoomSelection};
use super::responses::{BookingSummary, DueResponse, PricedLine};

/// Compare-and-set retries before a transition gives up
const MAX_TRANSITION_ATTEMPTS: usize = 3;

async fn load_booking(store: &dyn InventoryStore, id: i32) -> Result<Booking> {
    store
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking", id))
}

fn validate_contact(contact: &GuestContact) -> Result<()> {
    if contact.full_name.trim().is_empty() {
        return Err(AppError::Validation("full name is required".to_string()));
    }
    if !contact.email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    Ok(())
}

/// Selections that book at least one room. Zero quantities are dropped.
fn booked_selections(selections: &[RoomSelection]) -> Result<Vec<&RoomSelection>> {
    if let Some(bad) = selections.iter().find(|s| s.quantity < 0) {
        return Err(AppError::Validation(format!(
            "quantity for room {} must not be negative",
            bad.room_id
        )));
    }
    if let Some(bad) = selections
        .iter()
        .find(|s| s.adult_count < 0 || s.children_count < 0)
    {
        return Err(AppError::Validation(format!(
            "guest counts for room {} must not be negative",
            bad.room_id
        )));
    }

    let booked: Vec<&RoomSelection> = selections.iter().filter(|s| s.quantity > 0).collect();
    if booked.is_empty() {
        return Err(AppError::Validation("no room selected".to_string()));
    }
    Ok(booked)
}

/// Move a booking through the status machine.
///
/// `plan` maps the current status to the next one (`None` for no change).
/// When the stored status moved underneath us the booking is reloaded and
/// planned again.
async fn drive<F>(store: &dyn InventoryStore, mut booking: Booking, plan: F) -> Result<Booking>
where
    F: Fn(BookingStatus) -> Result<Option<BookingStatus>>,
{
    for _ in 0..MAX_TRANSITION_ATTEMPTS {
        let from = booking.status;
        let Some(to) = plan(from)? else {
            return Ok(booking);
        };

        let effect = lifecycle::capacity_effect(from, to);
        if store.transition_status(booking.id, from, to, effect).await? {
            info!(
                booking_id = booking.id,
                from = ?from,
                to = ?to,
                capacity = ?effect,
                "Booking status changed"
            );
            booking.status = to;
            return Ok(booking);
        }

        warn!(
            booking_id = booking.id,
            expected = ?from,
            "Booking status changed concurrently, re-planning"
        );
        booking = load_booking(store, booking.id).await?;
    }

    Err(AppError::Conflict(format!(
        "booking {} is being updated concurrently",
        booking.id
    )))
}

/// Create a booking with one line per selection.
///
/// The store re-counts overlapping non-cancelled bookings under a lock on each
/// hotel detail while inserting, so two concurrent requests cannot both take
/// the last room. The booking and its lines are written atomically. A non-Pending
/// initial status (admin only) is reached through the status machine so the
/// matching capacity effect applies.
pub async fn create_booking(
    store: &dyn InventoryStore,
    principal: &Principal,
    request: CreateBookingRequest,
) -> Result<Booking> {
    let CreateBookingRequest {
        customer,
        check_in,
        check_out,
        selections,
        status,
    } = request;

    let stay = StayRange::new(check_in, check_out)?;
    validate_contact(&customer)?;
    let selected = booked_selections(&selections)?;

    let initial = status.unwrap_or(BookingStatus::Pending);
    if initial != BookingStatus::Pending {
        principal.require_admin()?;
        lifecycle::plan_status(BookingStatus::Pending, initial)?;
    }

    let mut hd_ids: Vec<i32> = selected.iter().map(|s| s.hotel_detail_id).collect();
    hd_ids.sort_unstable();
    hd_ids.dedup();
    let details = store.get_hotel_details(&hd_ids).await?;

    for selection in &selected {
        let detail = details
            .get(&selection.hotel_detail_id)
            .ok_or_else(|| AppError::not_found("HotelDetail", selection.hotel_detail_id))?;
        if detail.room_id != selection.room_id {
            return Err(AppError::Validation(format!(
                "hotel detail {} does not offer room {}",
                detail.id, selection.room_id
            )));
        }
        if detail.status != RoomStatus::Available {
            return Err(AppError::Conflict(format!(
                "room {} is not open for booking at hotel detail {}",
                selection.room_id, detail.id
            )));
        }
    }

    let lines: Vec<NewRoomDetail> = selected
        .iter()
        .map(|s| NewRoomDetail {
            room_id: s.room_id,
            hotel_detail_id: s.hotel_detail_id,
            quantity: s.quantity,
            adult_count: s.adult_count,
            children_count: s.children_count,
        })
        .collect();

    let booking = store
        .insert_booking(
            NewBooking {
                user_id: principal.user_id,
                room_id: selected[0].room_id,
                contact: customer,
                booking_date: Utc::now(),
                stay,
                status: BookingStatus::Pending,
            },
            lines,
        )
        .await?;

    info!(
        booking_id = booking.id,
        user_id = principal.user_id,
        lines = selected.len(),
        check_in = %stay.check_in,
        check_out = %stay.check_out,
        "Booking created"
    );

    if initial == BookingStatus::Pending {
        return Ok(booking);
    }
    drive(store, booking, |current| lifecycle::plan_status(current, initial)).await
}

/// Price every line of a booking with the promotions running on `as_of`
async fn price_lines(
    store: &dyn InventoryStore,
    policy: &PricingPolicy,
    booking: &Booking,
    lines: &[RoomDetail],
    as_of: Option<NaiveDate>,
) -> Result<Vec<PricedLine>> {
    let mut room_ids: Vec<i32> = lines.iter().map(|l| l.room_id).collect();
    room_ids.sort_unstable();
    room_ids.dedup();
    let hd_ids: Vec<i32> = lines.iter().filter_map(|l| l.hotel_detail_id).collect();

    let rooms = store.get_rooms(&room_ids).await?;
    let details = store.get_hotel_details(&hd_ids).await?;
    let hotel_ids: Vec<i32> = details.values().map(|d| d.hotel_id).collect();
    let hotels = store.get_hotels(&hotel_ids).await?;
    let promotions = active_promotions_by_room(store, &room_ids, as_of).await?;
    let nights = booking.stay().nights();

    lines
        .iter()
        .map(|line| {
            let room = rooms
                .get(&line.room_id)
                .ok_or_else(|| AppError::not_found("Room", line.room_id))?;
            let hotel = line
                .hotel_detail_id
                .and_then(|id| details.get(&id))
                .and_then(|d| hotels.get(&d.hotel_id));

            Ok(PricedLine {
                room_detail_id: line.id,
                room_id: room.id,
                room_name: room.name.clone(),
                hotel_detail_id: line.hotel_detail_id,
                hotel_name: hotel.map(|h| h.name.clone()),
                hotel_address: hotel.map(|h| h.address.clone()),
                quantity: line.quantity,
                adult_count: line.adult_count,
                children_count: line.children_count,
                price: resolve_price(
                    policy,
                    room,
                    line.adult_count,
                    line.quantity,
                    nights,
                    promotions.get(&room.id),
                ),
            })
        })
        .collect()
}

async fn summarize(
    store: &dyn InventoryStore,
    policy: &PricingPolicy,
    booking: Booking,
    as_of: Option<NaiveDate>,
) -> Result<BookingSummary> {
    let lines = store.room_details(booking.id).await?;
    let priced = price_lines(store, policy, &booking, &lines, as_of).await?;

    let total = stay_total(priced.iter().map(|l| &l.price));
    let due = lifecycle::amount_due(booking.status, total);

    Ok(BookingSummary {
        nights: booking.stay().nights(),
        lines: priced,
        total: MoneyResponse::new(total, &policy.currency),
        deposit: MoneyResponse::new(deposit_amount(total), &policy.currency),
        due: MoneyResponse::new(due, &policy.currency),
        booking,
    })
}

/// Booking total in whole currency units
pub async fn booking_total(
    store: &dyn InventoryStore,
    policy: &PricingPolicy,
    booking: &Booking,
) -> Result<Decimal> {
    let lines = store.room_details(booking.id).await?;
    let priced = price_lines(store, policy, booking, &lines, None).await?;
    Ok(stay_total(priced.iter().map(|l| &l.price)))
}

/// Amount still owed: the full total while Pending or Confirmed, half of it
/// once Deposited, nothing when Paid, Completed or Cancelled
pub async fn compute_due(
    store: &dyn InventoryStore,
    policy: &PricingPolicy,
    booking: &Booking,
) -> Result<Decimal> {
    let total = booking_total(store, policy, booking).await?;
    Ok(lifecycle::amount_due(booking.status, total))
}

/// Due amount of a booking visible to the principal
pub async fn booking_due(
    store: &dyn InventoryStore,
    policy: &PricingPolicy,
    principal: &Principal,
    booking_id: i32,
) -> Result<DueResponse> {
    let booking = load_booking(store, booking_id).await?;
    principal.require_owner_or_admin(booking.user_id)?;

    let total = booking_total(store, policy, &booking).await?;
    Ok(DueResponse {
        booking_id: booking.id,
        status: booking.status,
        total: MoneyResponse::new(total, &policy.currency),
        due: MoneyResponse::new(lifecycle::amount_due(booking.status, total), &policy.currency),
    })
}

/// Booking with priced lines, total, deposit and due
pub async fn get_booking_summary(
    store: &dyn InventoryStore,
    policy: &PricingPolicy,
    principal: &Principal,
    booking_id: i32,
) -> Result<BookingSummary> {
    let booking = load_booking(store, booking_id).await?;
    principal.require_owner_or_admin(booking.user_id)?;
    summarize(store, policy, booking, None).await
}

/// The principal's bookings, newest first
pub async fn list_my_bookings(
    store: &dyn InventoryStore,
    principal: &Principal,
) -> Result<Vec<Booking>> {
    store.bookings_for_user(principal.user_id).await
}

/// Record a successful payment.
///
/// Deposit moves the booking to Deposited, Full to Paid. Capacity is consumed
/// only when the booking was not already Deposited or Paid, and a Paid
/// booking never goes back to Deposited, so repeated callbacks are no-ops.
pub async fn confirm_payment(
    store: &dyn InventoryStore,
    principal: &Principal,
    booking_id: i32,
    kind: PaymentKind,
) -> Result<Booking> {
    let booking = load_booking(store, booking_id).await?;
    principal.require_owner_or_admin(booking.user_id)?;

    let before = booking.status;
    let booking = drive(store, booking, |current| lifecycle::plan_payment(current, kind)).await?;

    info!(
        booking_id,
        kind = ?kind,
        before = ?before,
        status = ?booking.status,
        "Payment confirmed"
    );
    Ok(booking)
}

/// Amount to charge for a payment of `kind`: half the total for a deposit,
/// the whole total for a full payment
pub async fn payment_amount(
    store: &dyn InventoryStore,
    policy: &PricingPolicy,
    principal: &Principal,
    booking_id: i32,
    kind: PaymentKind,
) -> Result<Decimal> {
    let booking = load_booking(store, booking_id).await?;
    principal.require_owner_or_admin(booking.user_id)?;

    if lifecycle::plan_payment(booking.status, kind)?.is_none() {
        return Err(AppError::Conflict(format!(
            "booking {} needs no {:?} payment in status {:?}",
            booking.id, kind, booking.status
        )));
    }

    let total = booking_total(store, policy, &booking).await?;
    let amount = match kind {
        PaymentKind::Deposit => deposit_amount(total),
        PaymentKind::Full => round_money(total, 0),
    };
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "payment amount for booking {} must be positive",
            booking.id
        )));
    }
    Ok(amount)
}

/// Cancel a booking (owner or admin). Capacity held by a Deposited or Paid
/// booking is handed back.
pub async fn cancel_booking(
    store: &dyn InventoryStore,
    principal: &Principal,
    booking_id: i32,
) -> Result<Booking> {
    let booking = load_booking(store, booking_id).await?;
    principal.require_owner_or_admin(booking.user_id)?;
    lifecycle::plan_cancel(booking.status)?;

    let booking = drive(store, booking, lifecycle::plan_cancel).await?;
    info!(booking_id, user_id = principal.user_id, "Booking cancelled");
    Ok(booking)
}

/// Delete a booking and its lines (admin only). A booking still holding
/// capacity is cancelled first so the capacity is handed back.
pub async fn delete_booking(
    store: &dyn InventoryStore,
    principal: &Principal,
    booking_id: i32,
) -> Result<()> {
    principal.require_admin()?;
    let booking = load_booking(store, booking_id).await?;

    if lifecycle::holds_capacity(booking.status) {
        drive(store, booking, lifecycle::plan_cancel).await?;
    }

    if !store.delete_booking(booking_id).await? {
        return Err(AppError::not_found("Booking", booking_id));
    }
    info!(booking_id, admin_id = principal.user_id, "Booking deleted");
    Ok(())
}

/// Admin status change through the same transition table
pub async fn update_status(
    store: &dyn InventoryStore,
    principal: &Principal,
    booking_id: i32,
    status: BookingStatus,
) -> Result<Booking> {
    principal.require_admin()?;
    let booking = load_booking(store, booking_id).await?;
    drive(store, booking, |current| lifecycle::plan_status(current, status)).await
}

/// Edit the guest contact of a booking (owner only, not once the booking is
/// completed or cancelled)
pub async fn update_customer(
    store: &dyn InventoryStore,
    principal: &Principal,
    booking_id: i32,
    contact: GuestContact,
) -> Result<Booking> {
    let booking = load_booking(store, booking_id).await?;
    if booking.user_id != principal.user_id {
        return Err(AppError::Forbidden(
            "only the guest who booked can edit the contact details".to_string(),
        ));
    }
    if lifecycle::is_terminal(booking.status) {
        return Err(AppError::Forbidden(format!(
            "booking is {:?} and can no longer be edited",
            booking.status
        )));
    }
    validate_contact(&contact)?;

    store.update_contact(booking_id, &contact).await?;
    load_booking(store, booking_id).await
}
