//! Per-vendor route session state machine.
//!
//! A route session is one continuous sharing-location episode, from start to
//! stop. The engine guarantees at most one open session per vendor: starting
//! a new route force-closes anything still open, which keeps the invariant
//! intact even under duplicate or racing start calls.
//!
//! Distance is computed once, at the moment a session closes. That keeps
//! [`RouteTracker::record_point`] O(1) on the hot path; `stop` is O(n) in
//! points and only runs once per session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::geo::{track_distance, Coordinates};
use crate::vendor::{VendorDirectory, VendorId};

/// Route session identity. UUIDv7 so newest-first ordering is cheap.
pub type SessionId = Uuid;

/// One recorded (latitude, longitude, timestamp) sample within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
    pub recorded_at: DateTime<Utc>,
}

/// One vendor-sharing-location episode.
///
/// `ended_at == None` means the session is open. `distance_m` is only
/// meaningful once the session has closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSession {
    pub id: SessionId,
    pub vendor_id: VendorId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub points: Vec<TrackPoint>,
    pub distance_m: f64,
}

impl RouteSession {
    fn open(vendor_id: VendorId, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            vendor_id,
            started_at,
            ended_at: None,
            points: Vec::new(),
            distance_m: 0.0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    fn close(&mut self, ended_at: DateTime<Utc>) {
        let coordinates: Vec<Coordinates> = self
            .points
            .iter()
            .map(|p| Coordinates::new(p.lat, p.lng))
            .collect();
        self.distance_m = track_distance(&coordinates);
        self.ended_at = Some(ended_at);
    }
}

/// A session returned by [`RouteTracker::stop`], closed with its distance
/// computed.
pub type ClosedRoute = RouteSession;

type VendorSessions = Arc<Mutex<Vec<RouteSession>>>;

/// Route session engine: one state machine per vendor.
///
/// Locking is keyed per vendor id. The outer map lock is only held long
/// enough to resolve a vendor's session list, so operations on different
/// vendors never serialize against each other.
pub struct RouteTracker {
    directory: Arc<dyn VendorDirectory>,
    sessions: RwLock<HashMap<VendorId, VendorSessions>>,
}

impl RouteTracker {
    pub fn new(directory: Arc<dyn VendorDirectory>) -> Self {
        Self {
            directory,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new route session for the vendor.
    ///
    /// Any session still open for this vendor is force-closed first, with its
    /// distance computed as of closure. Returns the fresh open session.
    pub fn start(&self, vendor_id: VendorId) -> RouteSession {
        let sessions = self.vendor_sessions(vendor_id);
        let mut sessions = sessions.lock().expect("session lock poisoned");

        let now = Utc::now();
        for session in sessions.iter_mut().filter(|s| s.is_open()) {
            tracing::warn!(
                vendor_id,
                session_id = %session.id,
                "force-closing stale open session on start"
            );
            session.close(now);
        }

        let session = RouteSession::open(vendor_id, Utc::now());
        tracing::info!(vendor_id, session_id = %session.id, "route session started");
        sessions.push(session.clone());
        session
    }

    /// Append a position sample to the vendor's open session and update the
    /// vendor's live position.
    ///
    /// The access gate rejects unauthorized updates upstream; the missing
    /// open session is still re-checked here.
    pub fn record_point(&self, vendor_id: VendorId, lat: f64, lng: f64) -> Result<SessionId> {
        let sessions = self.vendor_sessions(vendor_id);
        let mut sessions = sessions.lock().expect("session lock poisoned");

        let session = sessions
            .iter_mut()
            .rev()
            .find(|s| s.is_open())
            .ok_or(Error::NoActiveSession { vendor_id })?;

        session.points.push(TrackPoint {
            lat,
            lng,
            recorded_at: Utc::now(),
        });
        self.directory.set_position(vendor_id, lat, lng);

        Ok(session.id)
    }

    /// Close the vendor's open session(s) and compute traveled distance.
    ///
    /// Clears the vendor's live position so observers see it disappear from
    /// the map. Returns the most recently started of the now-closed sessions
    /// with its full point list.
    pub fn stop(&self, vendor_id: VendorId) -> Result<ClosedRoute> {
        let sessions = self.vendor_sessions(vendor_id);
        let mut sessions = sessions.lock().expect("session lock poisoned");

        let now = Utc::now();
        let mut closed_indices = Vec::new();
        for (index, session) in sessions.iter_mut().enumerate() {
            if session.is_open() {
                session.close(now);
                closed_indices.push(index);
            }
        }

        let closed = closed_indices
            .into_iter()
            .max_by_key(|&index| sessions[index].started_at)
            .map(|index| sessions[index].clone())
            .ok_or(Error::NoOpenSession { vendor_id })?;

        self.directory.clear_position(vendor_id);
        tracing::info!(
            vendor_id,
            session_id = %closed.id,
            distance_m = closed.distance_m,
            points = closed.points.len(),
            "route session closed"
        );

        Ok(closed)
    }

    /// All sessions for the vendor, newest first, with points and distance.
    pub fn routes(&self, vendor_id: VendorId) -> Vec<RouteSession> {
        let sessions = self.vendor_sessions(vendor_id);
        let sessions = sessions.lock().expect("session lock poisoned");

        let mut routes: Vec<RouteSession> = sessions.clone();
        routes.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        routes
    }

    /// Count of currently open sessions across all vendors, for readiness
    /// reporting.
    pub fn open_session_count(&self) -> usize {
        let map = self.sessions.read().expect("session map lock poisoned");
        map.values()
            .map(|sessions| {
                sessions
                    .lock()
                    .expect("session lock poisoned")
                    .iter()
                    .filter(|s| s.is_open())
                    .count()
            })
            .sum()
    }

    fn vendor_sessions(&self, vendor_id: VendorId) -> VendorSessions {
        {
            let map = self.sessions.read().expect("session map lock poisoned");
            if let Some(sessions) = map.get(&vendor_id) {
                return Arc::clone(sessions);
            }
        }
        let mut map = self.sessions.write().expect("session map lock poisoned");
        Arc::clone(map.entry(vendor_id).or_default())
    }
}
