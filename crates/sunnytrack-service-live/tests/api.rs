//! HTTP surface tests for the live tracking service.

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use sunnytrack_lib::Subscription;
use sunnytrack_service_live::{app, AppState, VendorSeed};

fn seed(id: u64, active: bool) -> VendorSeed {
    VendorSeed {
        id,
        name: format!("Vendor {id}"),
        product: "Bolas de Berlim".to_string(),
        email: format!("vendor{id}@example.com"),
        password: "Secret123".to_string(),
        subscription: Subscription {
            active,
            expires_at: Utc::now() + Duration::days(7),
        },
    }
}

fn seeded_state() -> AppState {
    let state = AppState::new(b"test-service-secret".to_vec(), Duration::hours(24));
    state.add_vendor(seed(1, true));
    state.add_vendor(seed(2, false));
    state
}

fn server() -> TestServer {
    TestServer::new(app(seeded_state())).expect("test server builds")
}

async fn login(server: &TestServer, id: u64) -> String {
    let response = server
        .post("/api/v1/token")
        .json(&json!({
            "email": format!("vendor{id}@example.com"),
            "password": "Secret123",
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().expect("token present").to_string()
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let server = server();

    let response = server
        .post("/api/v1/token")
        .json(&json!({"email": "vendor1@example.com", "password": "nope"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["type"], "/problems/unauthorized");
}

#[tokio::test]
async fn login_returns_a_three_segment_token() {
    let server = server();
    let token = login(&server, 1).await;
    assert_eq!(token.split('.').count(), 3);
}

#[tokio::test]
async fn full_route_flow_over_http() {
    let server = server();
    let token = login(&server, 1).await;

    // Start a route.
    let response = server
        .post("/api/v1/vendors/1/routes/start")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let started: Value = response.json();
    let session_id = started["session_id"].as_str().expect("session id").to_string();

    // Report one position.
    let response = server
        .put("/api/v1/vendors/1/location")
        .authorization_bearer(&token)
        .json(&json!({"lat": 1.0, "lng": 1.0}))
        .await;
    response.assert_status_ok();
    let accepted: Value = response.json();
    assert_eq!(accepted["accepted"], true);
    assert_eq!(accepted["session_id"], session_id.as_str());

    // The public listing now shows the vendor on the map.
    let vendors: Value = server.get("/api/v1/vendors").await.json();
    let vendor = vendors
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["id"] == 1)
        .unwrap();
    assert_eq!(vendor["current_lat"], 1.0);

    // Stop: the closed session comes back with points and distance.
    let response = server
        .post("/api/v1/vendors/1/routes/stop")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let closed: Value = response.json();
    assert_eq!(closed["id"], session_id.as_str());
    assert_eq!(closed["points"].as_array().unwrap().len(), 1);
    assert_eq!(closed["distance_m"], 0.0);
    assert!(!closed["ended_at"].is_null());

    // Position is absent again, not zero.
    let vendors: Value = server.get("/api/v1/vendors").await.json();
    let vendor = vendors
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["id"] == 1)
        .unwrap();
    assert!(vendor["current_lat"].is_null());

    // Listing returns the single closed session.
    let response = server
        .get("/api/v1/vendors/1/routes")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let routes: Value = response.json();
    assert_eq!(routes.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn location_without_open_route_is_a_bad_request() {
    let server = server();
    let token = login(&server, 1).await;

    let response = server
        .put("/api/v1/vendors/1/location")
        .authorization_bearer(&token)
        .json(&json!({"lat": 1.0, "lng": 1.0}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["type"], "/problems/route-state");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let server = server();

    let response = server
        .put("/api/v1/vendors/1/location")
        .json(&json!({"lat": 1.0, "lng": 1.0}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_token_is_unauthorized() {
    let server = server();
    let token = login(&server, 1).await;
    let tampered = format!("{}A", &token[..token.len() - 1]);

    let response = server
        .post("/api/v1/vendors/1/routes/start")
        .authorization_bearer(&tampered)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn vendors_cannot_mutate_each_other() {
    let server = server();
    let token_for_two = login(&server, 2).await;

    let response = server
        .post("/api/v1/vendors/1/routes/start")
        .authorization_bearer(&token_for_two)
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["type"], "/problems/not-authorized");
}

#[tokio::test]
async fn inactive_subscription_blocks_location_updates() {
    let server = server();
    let token = login(&server, 2).await;

    // Route management still works without a subscription...
    server
        .post("/api/v1/vendors/2/routes/start")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    // ...but the location write path is gated.
    let response = server
        .put("/api/v1/vendors/2/location")
        .authorization_bearer(&token)
        .json(&json!({"lat": 1.0, "lng": 1.0}))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["type"], "/problems/subscription-inactive");
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected() {
    let server = server();
    let token = login(&server, 1).await;

    server
        .post("/api/v1/vendors/1/routes/start")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let response = server
        .put("/api/v1/vendors/1/location")
        .authorization_bearer(&token)
        .json(&json!({"lat": 91.0, "lng": 0.0}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["type"], "/problems/invalid-request");
}

#[tokio::test]
async fn stop_without_open_route_is_a_bad_request() {
    let server = server();
    let token = login(&server, 1).await;

    let response = server
        .post("/api/v1/vendors/1/routes/stop")
        .authorization_bearer(&token)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let server = server();

    server.get("/health/live").await.assert_status_ok();

    let ready = server.get("/health/ready").await;
    ready.assert_status_ok();
    let body: Value = ready.json();
    assert_eq!(body["vendors_loaded"], 2);
    assert_eq!(body["observers"], 0);
}

#[tokio::test]
async fn observers_receive_position_and_removal_events() {
    let server = TestServer::builder()
        .http_transport()
        .build(app(seeded_state()))
        .expect("test server builds");
    let token = login(&server, 1).await;

    server
        .post("/api/v1/vendors/1/routes/start")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let mut observer = server
        .get_websocket("/api/v1/live")
        .await
        .into_websocket()
        .await;

    server
        .put("/api/v1/vendors/1/location")
        .authorization_bearer(&token)
        .json(&json!({"lat": 5.5, "lng": -7.1}))
        .await
        .assert_status_ok();

    let event: Value = observer.receive_json().await;
    assert_eq!(event, json!({"vendor_id": 1, "lat": 5.5, "lng": -7.1}));

    server
        .post("/api/v1/vendors/1/routes/stop")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let event: Value = observer.receive_json().await;
    assert_eq!(
        event,
        json!({"vendor_id": 1, "lat": null, "lng": null, "removed": true})
    );
}
