//! HTTP surface.

pub mod admin;
pub mod bookings;
pub mod payments;
pub mod rooms;

use std::path::Path;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::AppState;

/// Build the application router.
///
/// # Routes
///
/// - `GET /health`
/// - `GET /api/rooms`, `GET /api/rooms/search`
/// - `POST /api/bookings`, `GET /api/bookings/mine`, `GET /api/bookings/:id`,
///   `PUT /api/bookings/:id/customer`, `POST /api/bookings/:id/cancel`,
///   `GET /api/bookings/:id/due`
/// - `POST /api/payments/:booking_id/confirm`, `GET /api/payments/:booking_id/amount`
/// - `/api/admin/...` for bookings, hotels, rooms, services, promotions and
///   the booking report
/// - `/media/*` static room images
pub fn router(state: AppState, media_dir: &Path) -> Router {
    let api = Router::new()
        .route("/rooms", get(rooms::list))
        .route("/rooms/search", get(rooms::search))
        .route("/bookings", post(bookings::create))
        .route("/bookings/mine", get(bookings::mine))
        .route("/bookings/:id", get(bookings::show))
        .route("/bookings/:id/customer", put(bookings::update_customer))
        .route("/bookings/:id/cancel", post(bookings::cancel))
        .route("/bookings/:id/due", get(bookings::due))
        .route("/payments/:booking_id/confirm", post(payments::confirm))
        .route("/payments/:booking_id/amount", get(payments::amount))
        .nest("/admin", admin::router());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Liveness check with cache statistics
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "cache": state.cache.stats(),
    }))
}
