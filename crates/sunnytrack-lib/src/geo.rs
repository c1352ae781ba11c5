//! Great-circle distance over the Earth's surface.
//!
//! Traveled distance for a closed route session is the sum of haversine hops
//! between consecutive track points, so this module stays a pure leaf with no
//! failure modes.

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle surface distance between two coordinate pairs, in meters.
///
/// Uses the haversine formula with the mean Earth radius. Symmetric in its
/// arguments, and zero for identical inputs.
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_phi = (b.lat - a.lat).to_radians();
    let delta_lambda = (b.lng - a.lng).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Cumulative distance along an ordered list of coordinates, in meters.
///
/// Zero or one points contribute nothing; every consecutive pair adds one
/// haversine hop.
pub fn track_distance(points: &[Coordinates]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance(pair[0], pair[1]))
        .sum()
}
