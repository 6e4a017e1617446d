//! Customer booking handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::Principal;
use crate::booking::{services, BookingSummary, CreateBookingRequest, DueResponse};
use crate::error::Result;
use crate::models::{Booking, GuestContact};
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>)> {
    let booking = services::create_booking(state.store.as_ref(), &principal, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn mine(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<Booking>>> {
    let bookings = services::list_my_bookings(state.store.as_ref(), &principal).await?;
    Ok(Json(bookings))
}

pub async fn show(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<BookingSummary>> {
    let summary =
        services::get_booking_summary(state.store.as_ref(), &state.pricing, &principal, id)
            .await?;
    Ok(Json(summary))
}

pub async fn update_customer(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(contact): Json<GuestContact>,
) -> Result<Json<Booking>> {
    let booking =
        services::update_customer(state.store.as_ref(), &principal, id, contact).await?;
    Ok(Json(booking))
}

pub async fn cancel(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<Booking>> {
    let booking = services::cancel_booking(state.store.as_ref(), &principal, id).await?;
    Ok(Json(booking))
}

pub async fn due(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<DueResponse>> {
    let due = services::booking_due(state.store.as_ref(), &state.pricing, &principal, id).await?;
    Ok(Json(due))
}
