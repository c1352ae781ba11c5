//! HTTP handlers and router assembly.
//!
//! Handlers stay thin: parse and validate the request, run the access gate,
//! call into the tracking core, and translate the outcome onto the wire.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use sunnytrack_lib::{LiveEvent, SessionId, SubjectKind, Vendor, VendorDirectory, VendorId};

use crate::health::{health_live, health_ready};
use crate::metrics::{
    self, metrics_handler, record_location_accepted, record_route_closed, record_route_started,
};
use crate::problem::{from_core_error, ProblemDetails};
use crate::request::{LocationUpdate, LoginRequest, Validate};
use crate::state::AppState;
use crate::ws::live_updates;

/// Build the service router over the shared state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/token", post(issue_token))
        .route("/api/v1/vendors", get(list_vendors))
        .route("/api/v1/vendors/{vendor_id}/location", put(record_location))
        .route("/api/v1/vendors/{vendor_id}/routes/start", post(start_route))
        .route("/api/v1/vendors/{vendor_id}/routes/stop", post(stop_route))
        .route("/api/v1/vendors/{vendor_id}/routes", get(list_routes))
        .route("/api/v1/live", get(live_updates))
        .route("/metrics", get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Extract `X-Request-ID` or generate a UUID v7 correlation id.
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token<'a>(
    headers: &'a HeaderMap,
    request_id: &str,
) -> Result<&'a str, Box<ProblemDetails>> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            Box::new(ProblemDetails::unauthorized(
                "Missing bearer token",
                request_id,
            ))
        })
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
}

/// Handle `POST /api/v1/token`: exchange credentials for a bearer token.
async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);

    if let Err(problem) = request.validate(&request_id) {
        return problem.into_response();
    }

    let Some(vendor_id) = state
        .directory()
        .authenticate(&request.email, &request.password)
    else {
        info!(request_id = %request_id, "login rejected");
        return ProblemDetails::unauthorized("Incorrect email or password", &request_id)
            .into_response();
    };

    let token = state
        .codec()
        .issue(vendor_id, SubjectKind::Vendor, state.token_ttl());
    info!(request_id = %request_id, vendor_id, "token issued");

    (
        StatusCode::OK,
        Json(TokenResponse {
            access_token: token,
            token_type: "bearer",
        }),
    )
        .into_response()
}

/// Handle `GET /api/v1/vendors`: public map-bootstrap listing.
async fn list_vendors(State(state): State<AppState>) -> Json<Vec<Vendor>> {
    Json(state.directory().vendors())
}

#[derive(Debug, Serialize)]
struct RouteStarted {
    session_id: SessionId,
    started_at: DateTime<Utc>,
}

/// Handle `POST /api/v1/vendors/{id}/routes/start`.
async fn start_route(
    State(state): State<AppState>,
    Path(vendor_id): Path<VendorId>,
    headers: HeaderMap,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);
    let token = match bearer_token(&headers, &request_id) {
        Ok(token) => token,
        Err(problem) => return problem.into_response(),
    };

    if let Err(e) = state.gate().authorize_vendor(token, vendor_id) {
        return from_core_error(&e, &request_id).into_response();
    }

    let session = state.tracker().start(vendor_id);
    record_route_started();
    info!(request_id = %request_id, vendor_id, session_id = %session.id, "route started");

    (
        StatusCode::OK,
        Json(RouteStarted {
            session_id: session.id,
            started_at: session.started_at,
        }),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
struct LocationAccepted {
    session_id: SessionId,
    accepted: bool,
}

/// Handle `PUT /api/v1/vendors/{id}/location`.
///
/// The accepted point is appended to the open session, mirrored onto the
/// vendor record, and fanned out to every connected observer.
async fn record_location(
    State(state): State<AppState>,
    Path(vendor_id): Path<VendorId>,
    headers: HeaderMap,
    Json(update): Json<LocationUpdate>,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);
    let token = match bearer_token(&headers, &request_id) {
        Ok(token) => token,
        Err(problem) => return problem.into_response(),
    };

    if let Err(problem) = update.validate(&request_id) {
        return problem.into_response();
    }

    if let Err(e) = state.gate().authorize_subscribed_vendor(token, vendor_id) {
        return from_core_error(&e, &request_id).into_response();
    }

    let session_id = match state
        .tracker()
        .record_point(vendor_id, update.lat, update.lng)
    {
        Ok(session_id) => session_id,
        Err(e) => return from_core_error(&e, &request_id).into_response(),
    };

    let delivered = state
        .hub()
        .publish(&LiveEvent::position(vendor_id, update.lat, update.lng));
    record_location_accepted();
    metrics::record_event_published(delivered);
    info!(
        request_id = %request_id,
        vendor_id,
        session_id = %session_id,
        observers = delivered,
        "location accepted"
    );

    (
        StatusCode::OK,
        Json(LocationAccepted {
            session_id,
            accepted: true,
        }),
    )
        .into_response()
}

/// Handle `POST /api/v1/vendors/{id}/routes/stop`.
///
/// Returns the closed session with its computed distance and point list, and
/// tells observers the vendor left the map.
async fn stop_route(
    State(state): State<AppState>,
    Path(vendor_id): Path<VendorId>,
    headers: HeaderMap,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);
    let token = match bearer_token(&headers, &request_id) {
        Ok(token) => token,
        Err(problem) => return problem.into_response(),
    };

    if let Err(e) = state.gate().authorize_vendor(token, vendor_id) {
        return from_core_error(&e, &request_id).into_response();
    }

    let closed = match state.tracker().stop(vendor_id) {
        Ok(closed) => closed,
        Err(e) => return from_core_error(&e, &request_id).into_response(),
    };

    let delivered = state.hub().publish(&LiveEvent::vendor_removed(vendor_id));
    record_route_closed(closed.distance_m);
    metrics::record_event_published(delivered);
    info!(
        request_id = %request_id,
        vendor_id,
        session_id = %closed.id,
        distance_m = closed.distance_m,
        "route stopped"
    );

    (StatusCode::OK, Json(closed)).into_response()
}

/// Handle `GET /api/v1/vendors/{id}/routes`: sessions newest first.
async fn list_routes(
    State(state): State<AppState>,
    Path(vendor_id): Path<VendorId>,
    headers: HeaderMap,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);
    let token = match bearer_token(&headers, &request_id) {
        Ok(token) => token,
        Err(problem) => return problem.into_response(),
    };

    if let Err(e) = state.gate().authorize_vendor(token, vendor_id) {
        return from_core_error(&e, &request_id).into_response();
    }

    (StatusCode::OK, Json(state.tracker().routes(vendor_id))).into_response()
}
