//! SunnyTrack live tracking service entry point.
//!
//! # Configuration
//!
//! - `SUNNYTRACK_TOKEN_SECRET` - HMAC secret for bearer tokens (required)
//! - `SUNNYTRACK_TOKEN_TTL_SECS` - Token lifetime in seconds (default: 86400)
//! - `SUNNYTRACK_SEED_PATH` - Optional JSON vendor seed file
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text

use std::env;
use std::net::SocketAddr;

use chrono::Duration;
use tracing::{info, warn};

use sunnytrack_service_live::logging::{init_logging, LogFormat};
use sunnytrack_service_live::metrics::init_metrics;
use sunnytrack_service_live::{app, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogFormat::from_env());

    if let Err(e) = init_metrics() {
        // Log but don't fail - metrics are optional
        warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let secret = env::var("SUNNYTRACK_TOKEN_SECRET")
        .map_err(|_| "SUNNYTRACK_TOKEN_SECRET must be set")?;
    let ttl_secs: i64 = env::var("SUNNYTRACK_TOKEN_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(86_400);
    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let state = AppState::new(secret.into_bytes(), Duration::seconds(ttl_secs));

    if let Ok(seed_path) = env::var("SUNNYTRACK_SEED_PATH") {
        let loaded = state.seed_from_file(&seed_path)?;
        info!(seed_path = %seed_path, vendors = loaded, "vendor directory seeded");
    }

    info!(
        port,
        token_ttl_secs = ttl_secs,
        vendors = state.directory().vendor_count(),
        "starting live tracking service"
    );

    let app = app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
