//! Admin handlers. Role checks happen in the services.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::admin::reports::{self, BookingReport, ReportQuery};
use crate::admin::rooms::{self, RoomView};
use crate::admin::{hotels, promotions, services};
use crate::auth::Principal;
use crate::booking::requests::UpdateStatusRequest;
use crate::booking::services as bookings;
use crate::db::PromotionWithDetails;
use crate::error::Result;
use crate::models::{
    Booking, Hotel, HotelDetail, HotelDetailInput, HotelInput, PromotionInput, RoomInput,
    ServiceInput, ServiceWithRooms,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings/:id", delete(delete_booking))
        .route("/bookings/:id/status", put(update_booking_status))
        .route("/hotels", post(create_hotel))
        .route("/hotels/:id", put(update_hotel).delete(delete_hotel))
        .route("/hotels/:id/details", put(replace_hotel_details))
        .route("/promotions", get(list_promotions).post(create_promotion))
        .route(
            "/promotions/:id",
            put(update_promotion).delete(delete_promotion),
        )
        .route("/rooms", post(create_room))
        .route("/rooms/:id", put(update_room).delete(delete_room))
        .route("/services", get(list_services).post(create_service))
        .route("/services/:id", put(update_service).delete(delete_service))
        .route("/reports/bookings", get(booking_report))
}

// ==================== bookings ====================

async fn delete_booking(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    bookings::delete_booking(state.store.as_ref(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_booking_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>> {
    let booking =
        bookings::update_status(state.store.as_ref(), &principal, id, request.status).await?;
    Ok(Json(booking))
}

// ==================== hotels ====================

async fn create_hotel(
    State(state): State<AppState>,
    principal: Principal,
    Json(input): Json<HotelInput>,
) -> Result<(StatusCode, Json<Hotel>)> {
    let hotel = hotels::create_hotel(state.store.as_ref(), &principal, input).await?;
    Ok((StatusCode::CREATED, Json(hotel)))
}

async fn update_hotel(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(input): Json<HotelInput>,
) -> Result<Json<Hotel>> {
    let hotel = hotels::update_hotel(state.store.as_ref(), &principal, id, input).await?;
    Ok(Json(hotel))
}

async fn delete_hotel(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    hotels::delete_hotel(state.store.as_ref(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn replace_hotel_details(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(details): Json<Vec<HotelDetailInput>>,
) -> Result<Json<Vec<HotelDetail>>> {
    let written =
        hotels::replace_hotel_details(state.store.as_ref(), &principal, id, details).await?;
    Ok(Json(written))
}

// ==================== promotions ====================

async fn list_promotions(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<PromotionWithDetails>>> {
    let all = promotions::list_promotions(state.store.as_ref(), &principal).await?;
    Ok(Json(all))
}

async fn create_promotion(
    State(state): State<AppState>,
    principal: Principal,
    Json(input): Json<PromotionInput>,
) -> Result<(StatusCode, Json<PromotionWithDetails>)> {
    let written = promotions::create_promotion(state.store.as_ref(), &principal, input).await?;
    Ok((StatusCode::CREATED, Json(written)))
}

async fn update_promotion(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(input): Json<PromotionInput>,
) -> Result<Json<PromotionWithDetails>> {
    let written =
        promotions::update_promotion(state.store.as_ref(), &principal, id, input).await?;
    Ok(Json(written))
}

async fn delete_promotion(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    promotions::delete_promotion(state.store.as_ref(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== rooms ====================

async fn create_room(
    State(state): State<AppState>,
    principal: Principal,
    Json(input): Json<RoomInput>,
) -> Result<(StatusCode, Json<RoomView>)> {
    let room = rooms::create_room(state.store.as_ref(), &state.cache, &principal, input).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn update_room(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(input): Json<RoomInput>,
) -> Result<Json<RoomView>> {
    let room =
        rooms::update_room(state.store.as_ref(), &state.cache, &principal, id, input).await?;
    Ok(Json(room))
}

async fn delete_room(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    rooms::delete_room(state.store.as_ref(), &state.cache, &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== services ====================

async fn list_services(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<ServiceWithRooms>>> {
    let all = services::list_services(state.store.as_ref(), &principal).await?;
    Ok(Json(all))
}

async fn create_service(
    State(state): State<AppState>,
    principal: Principal,
    Json(input): Json<ServiceInput>,
) -> Result<(StatusCode, Json<ServiceWithRooms>)> {
    let written =
        services::create_service(state.store.as_ref(), &state.cache, &principal, input).await?;
    Ok((StatusCode::CREATED, Json(written)))
}

async fn update_service(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(input): Json<ServiceInput>,
) -> Result<Json<ServiceWithRooms>> {
    let written =
        services::update_service(state.store.as_ref(), &state.cache, &principal, id, input)
            .await?;
    Ok(Json(written))
}

async fn delete_service(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    services::delete_service(state.store.as_ref(), &state.cache, &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== reports ====================

async fn booking_report(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ReportQuery>,
) -> Result<Json<BookingReport>> {
    let report = reports::booking_report(state.store.as_ref(), &principal, query).await?;
    Ok(Json(report))
}
