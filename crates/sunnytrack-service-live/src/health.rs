//! Health check handlers for liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health status response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok" or "not_ready: <reason>".
    pub status: String,

    /// Service name for identification.
    pub service: String,

    /// Service version from build-time.
    pub version: String,

    /// Vendors known to the directory (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendors_loaded: Option<usize>,

    /// Currently open route sessions (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_sessions: Option<usize>,

    /// Currently connected live observers (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observers: Option<usize>,
}

impl HealthStatus {
    fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            vendors_loaded: None,
            open_sessions: None,
            observers: None,
        }
    }
}

/// Liveness probe: the process is up. No external dependencies checked.
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe: the service can take traffic, with a snapshot of the
/// tracking state. The directory may legitimately be empty (no vendors
/// seeded yet), so readiness never fails on counts.
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let mut status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    status.vendors_loaded = Some(state.directory().vendor_count());
    status.open_sessions = Some(state.tracker().open_session_count());
    status.observers = Some(state.hub().observer_count());

    (StatusCode::OK, Json(status)).into_response()
}
