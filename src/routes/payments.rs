//! Payment gateway handlers.
//!
//! The gateway integration verifies its own signature and then reports the
//! payment here on behalf of the paying user.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::auth::Principal;
use crate::booking::requests::{ConfirmPaymentRequest, PaymentAmountQuery};
use crate::booking::responses::PaymentAmountResponse;
use crate::booking::services;
use crate::error::Result;
use crate::models::Booking;
use crate::pricing::MoneyResponse;
use crate::AppState;

pub async fn confirm(
    State(state): State<AppState>,
    principal: Principal,
    Path(booking_id): Path<i32>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<Booking>> {
    let booking =
        services::confirm_payment(state.store.as_ref(), &principal, booking_id, request.kind)
            .await?;
    Ok(Json(booking))
}

pub async fn amount(
    State(state): State<AppState>,
    principal: Principal,
    Path(booking_id): Path<i32>,
    Query(query): Query<PaymentAmountQuery>,
) -> Result<Json<PaymentAmountResponse>> {
    let amount = services::payment_amount(
        state.store.as_ref(),
        &state.pricing,
        &principal,
        booking_id,
        query.kind,
    )
    .await?;

    Ok(Json(PaymentAmountResponse {
        booking_id,
        kind: query.kind,
        amount: MoneyResponse::new(amount, &state.pricing.currency),
    }))
}
