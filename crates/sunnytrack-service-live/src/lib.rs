//! SunnyTrack live tracking HTTP/WebSocket microservice.
//!
//! Thin axum handlers over the `sunnytrack-lib` core: all tracking logic
//! (route sessions, token verification, broadcast fan-out) lives in the
//! library, this crate only provides HTTP glue, observability, and the
//! WebSocket observer loop.
//!
//! # Endpoints
//!
//! - `POST /api/v1/token` - Exchange vendor credentials for a bearer token
//! - `POST /api/v1/vendors/{id}/routes/start` - Open a route session
//! - `PUT /api/v1/vendors/{id}/location` - Report a position sample
//! - `POST /api/v1/vendors/{id}/routes/stop` - Close the open session
//! - `GET /api/v1/vendors/{id}/routes` - List the vendor's sessions
//! - `GET /api/v1/vendors` - Public map-bootstrap vendor listing
//! - `GET /api/v1/live` - WebSocket pushing live position events
//! - `GET /metrics`, `GET /health/live`, `GET /health/ready`

#![deny(warnings)]

pub mod handlers;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod problem;
pub mod request;
pub mod state;
pub mod ws;

pub use handlers::app;
pub use problem::{from_core_error, ProblemDetails};
pub use state::{AppState, VendorSeed};
