//! Structured logging setup.
//!
//! JSON output is the production default; `LOG_FORMAT=text` switches to a
//! human-readable pretty format for development. The level filter comes from
//! `RUST_LOG` (default `info`).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (default, production).
    #[default]
    Json,
    /// Human-readable text logging (development).
    Text,
}

impl LogFormat {
    /// Read the format from `LOG_FORMAT`. Accepts `text` or `pretty` for the
    /// text format; anything else means JSON.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if matches!(v.to_lowercase().as_str(), "text" | "pretty") => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }
}

/// Install the global tracing subscriber. Call once at startup.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(fmt::layer().pretty()).init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false).with_span_list(false))
            .init(),
    }
}
