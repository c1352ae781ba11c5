//! SunnyTrack live tracking core.
//!
//! This crate implements the pieces of the vendor tracking platform that are
//! hard to get right: the per-vendor route session state machine, the
//! broadcast hub that fans position events out to map observers, and the
//! compact signed bearer token that authenticates every mutating call.
//! Higher-level consumers (the HTTP service) should only depend on the types
//! exported here instead of reimplementing behavior.
//!
//! Everything around the core, such as vendor registration and account
//! management, is owned by the surrounding CRUD layer and reached through
//! the [`VendorDirectory`] trait.

#![deny(warnings)]

pub mod auth;
pub mod error;
pub mod geo;
pub mod hub;
pub mod session;
pub mod token;
pub mod vendor;

pub use auth::AccessGate;
pub use error::{Error, Result};
pub use geo::{haversine_distance, track_distance, Coordinates};
pub use hub::{LiveEvent, LiveHub, ObserverId};
pub use session::{ClosedRoute, RouteSession, RouteTracker, SessionId, TrackPoint};
pub use token::{Claims, SubjectKind, TokenCodec};
pub use vendor::{InMemoryVendorDirectory, Subscription, Vendor, VendorDirectory, VendorId};
