//! Prometheus metrics for the live tracking service.
//!
//! Business metrics only; request-level tracing comes from
//! `tower_http::trace`. Counters cover the write path (accepted locations,
//! opened/closed routes) and the fan-out path (published and dropped events);
//! a gauge tracks the live observer population.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Errors raised during metrics initialization.
#[derive(Debug, Clone)]
pub enum MetricsError {
    /// The recorder has already been installed.
    AlreadyInitialized,
    /// The Prometheus builder failed to install.
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            Self::InstallFailed(e) => write!(f, "failed to install metrics recorder: {e}"),
        }
    }
}

impl std::error::Error for MetricsError {}

/// Install the Prometheus recorder. Call once at startup, before any metric
/// is recorded.
pub fn init_metrics() -> Result<(), MetricsError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Axum handler for `GET /metrics`, Prometheus exposition format.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

/// A location update passed the gate and was appended to a session.
pub fn record_location_accepted() {
    counter!("locations_accepted_total").increment(1);
}

/// A route session was opened.
pub fn record_route_started() {
    counter!("routes_started_total").increment(1);
}

/// A route session was closed, with its traveled distance.
pub fn record_route_closed(distance_m: f64) {
    counter!("routes_closed_total").increment(1);
    counter!("route_distance_meters_total").increment(distance_m as u64);
}

/// A live event reached `delivered` observers.
pub fn record_event_published(delivered: usize) {
    counter!("live_events_published_total").increment(1);
    counter!("live_event_deliveries_total").increment(delivered as u64);
}

/// Update the live observer population gauge.
pub fn set_live_observers(count: usize) {
    gauge!("live_observers").set(count as f64);
}
