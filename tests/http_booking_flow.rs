//! End-to-end booking flow through the router with the in-memory store.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use hotel_booking::db::MemoryStore;
use hotel_booking::pricing::PricingPolicy;
use hotel_booking::{router, AppState};

async fn app() -> Router {
    let store = MemoryStore::with_demo_catalog().await.unwrap();
    let state = AppState::new(Arc::new(store), PricingPolicy::default());
    router(state, Path::new("media"))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<(i32, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, role)) = user {
        builder = builder
            .header("x-user-id", user_id.to_string())
            .header("x-user-role", role);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_search_validates_dates() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/rooms/search?check_in=2024-06-10",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation");
}

#[tokio::test]
async fn test_booking_requires_principal() {
    let app = app().await;
    let (status, _) = send(&app, Method::GET, "/api/bookings/mine", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_search_book_pay_flow() {
    let app = app().await;
    let guest = Some((42, "customer"));

    let (status, results) = send(
        &app,
        Method::GET,
        "/api/rooms/search?room_name=suite&check_in=2024-06-10&check_out=2024-06-12",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let suite = &results[0];
    assert_eq!(suite["remaining_rooms"], 2);
    let room_id = suite["room_id"].as_i64().unwrap();
    let hotel_detail_id = suite["hotel_detail_id"].as_i64().unwrap();

    let (status, booking) = send(
        &app,
        Method::POST,
        "/api/bookings",
        guest,
        Some(json!({
            "customer": { "full_name": "Lan Nguyen", "email": "lan@example.com" },
            "check_in": "2024-06-10",
            "check_out": "2024-06-12",
            "selections": [
                { "room_id": room_id, "hotel_detail_id": hotel_detail_id, "quantity": 2, "adult_count": 2 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "pending");
    let id = booking["id"].as_i64().unwrap();

    // Both suites are taken for the stay now
    let (_, results) = send(
        &app,
        Method::GET,
        "/api/rooms/search?room_name=suite&check_in=2024-06-11&check_out=2024-06-13",
        None,
        None,
    )
    .await;
    assert_eq!(results.as_array().unwrap().len(), 0);

    // Someone else cannot see the booking
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/bookings/{}", id),
        Some((7, "customer")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, due) = send(&app, Method::GET, &format!("/api/bookings/{}/due", id), guest, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(due["due"]["amount"], "0");

    for _ in 0..2 {
        let (status, paid) = send(
            &app,
            Method::POST,
            &format!("/api/payments/{}/confirm", id),
            guest,
            Some(json!({ "kind": "full" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["status"], "paid");
    }

    let (_, due) = send(&app, Method::GET, &format!("/api/bookings/{}/due", id), guest, None).await;
    assert_eq!(due["due"]["amount"], "0");

    let (status, mine) = send(&app, Method::GET, "/api/bookings/mine", guest, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    // Admin-only removal
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/bookings/{}", id),
        guest,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/bookings/{}", id),
        Some((1, "admin")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_admin_promotion_round_trip() {
    let app = app().await;
    let admin = Some((1, "admin"));

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/admin/promotions",
        admin,
        Some(json!({
            "name": "Autumn",
            "discount_amount": "150000",
            "start_date": "2024-09-01",
            "end_date": "2024-09-30",
            "room_ids": [1]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["details"][0]["discount_percent"], "10.00");

    let (status, all) = send(&app, Method::GET, "/api/admin/promotions", admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/admin/promotions",
        Some((2, "customer")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_role_is_unauthorized() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/bookings/mine", Some((42, "manager")), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_type"], "unauthorized");
}

#[tokio::test]
async fn test_admin_room_and_service_catalog() {
    let app = app().await;
    let admin = Some((1, "admin"));

    let (status, room) = send(
        &app,
        Method::POST,
        "/api/admin/rooms",
        admin,
        Some(json!({
            "name": "Garden Room",
            "size": 28.0,
            "price": "1700000",
            "bed_count": 1,
            "image_paths": ["rooms/garden.jpg"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(room["image_paths"], json!(["rooms/garden.jpg"]));
    let room_id = room["id"].as_i64().unwrap();

    let (status, service) = send(
        &app,
        Method::POST,
        "/api/admin/services",
        admin,
        Some(json!({ "name": "Breakfast", "price": "80000", "unit": "per day", "room_ids": [room_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(service["room_ids"], json!([room_id]));

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/rooms/{}", room_id),
        admin,
        Some(json!({
            "name": "Garden Room",
            "size": 28.0,
            "price": "1750000",
            "bed_count": 1,
            "image_paths": ["rooms/garden-2.jpg"],
            "remove_image_paths": ["rooms/garden.jpg"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, rooms) = send(&app, Method::GET, "/api/rooms", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let garden = rooms
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"].as_i64() == Some(room_id))
        .unwrap();
    assert_eq!(garden["price"], "1750000");
    assert_eq!(garden["image_paths"], json!(["rooms/garden-2.jpg"]));
    assert_eq!(garden["services"], json!(["Breakfast"]));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/rooms/{}", room_id),
        Some((2, "customer")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/rooms/{}", room_id),
        admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_booking_report() {
    let app = app().await;
    let admin = Some((1, "admin"));

    let (status, report) = send(
        &app,
        Method::GET,
        "/api/admin/reports/bookings?start=2024-06-01&end=2024-06-07",
        admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["start"], "2024-06-01");
    assert_eq!(report["end"], "2024-06-07");
    assert_eq!(report["room_types"], json!([]));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/admin/reports/bookings?start=2024-06-08&end=2024-06-07",
        admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation");
}
