//! Rent, unlock, lock and return a motorbike over HTTP.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{
    TestApp, ACTIVE_RIDE, ADMIN_TOKEN, FINISHED_RIDE, OTHER_RIDER_TOKEN, RENTED_BIKE, RIDER_ID,
    RIDER_TOKEN,
};

#[tokio::test]
async fn test_full_ride_flow() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/v1/rides", Some(RIDER_TOKEN), json!({"motorbike_id": 1}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], ACTIVE_RIDE);
    assert_eq!(body["data"]["user_id"], RIDER_ID);
    assert!(body["data"]["end_time"].is_null());

    let (status, body) = app
        .post("/api/v1/bluetooth/connect/1", Some(RIDER_TOKEN), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Motorbike unlocked");
    assert!(body["data"]["disconnected_at"].is_null());

    let (status, body) = app
        .post("/api/v1/bluetooth/disconnect/1", Some(RIDER_TOKEN), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"]["disconnected_at"].is_null());

    let (status, body) = app
        .put("/api/v1/rides/finish/10", Some(RIDER_TOKEN), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["duration_seconds"], 754);
    assert_eq!(body["data"]["cost"], 46.0);
}

#[tokio::test]
async fn test_second_active_ride_conflicts() {
    let app = TestApp::new();

    let (status, _) = app
        .post("/api/v1/rides", Some(RIDER_TOKEN), json!({"motorbike_id": 1}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post("/api/v1/rides", Some(RIDER_TOKEN), json!({"motorbike_id": 1}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_start_on_rented_or_missing_motorbike() {
    let app = TestApp::new();

    let (status, _) = app
        .post(
            "/api/v1/rides",
            Some(RIDER_TOKEN),
            json!({"motorbike_id": RENTED_BIKE}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/v1/rides", Some(RIDER_TOKEN), json!({"motorbike_id": 99}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post("/api/v1/rides", Some(RIDER_TOKEN), json!({"motorbike_id": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_finish_rules() {
    let app = TestApp::new();

    let (status, _) = app
        .put("/api/v1/rides/finish/10", Some(OTHER_RIDER_TOKEN), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(
            &format!("/api/v1/rides/finish/{}", FINISHED_RIDE),
            Some(RIDER_TOKEN),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Ride already finished");
    assert_eq!(body["error"]["details"], "user 7 finishing ride 11");
}

#[tokio::test]
async fn test_disconnect_twice_fails() {
    let app = TestApp::new();

    app.post("/api/v1/bluetooth/connect/1", Some(RIDER_TOKEN), json!({}))
        .await;
    let (status, _) = app
        .post("/api/v1/bluetooth/disconnect/1", Some(RIDER_TOKEN), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/api/v1/bluetooth/disconnect/1", Some(RIDER_TOKEN), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Bluetooth already disconnected");
    assert_eq!(
        body["error"]["details"],
        "user 7 disconnecting from motorbike 1"
    );
}

#[tokio::test]
async fn test_own_history_and_admin_views() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/v1/rides/me", Some(RIDER_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data_count"], 1);

    let (status, body) = app.get("/api/v1/bluetooth/me", Some(RIDER_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["user_id"], RIDER_ID);

    let (status, _) = app.get("/api/v1/rides/bike/1", Some(RIDER_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get("/api/v1/rides/bike/1", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["motorbike_id"], 1);

    let (status, _) = app.delete("/api/v1/rides/10", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.delete("/api/v1/rides/11", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Ride deleted");
}
