//! Broadcast hub fanning position events out to live map observers.
//!
//! One hub instance exists per server process and is injected into request
//! handlers; it is an explicit constructed object so tests can drive it with
//! fake observers.
//!
//! Observers are anonymous. Each connection is a bounded channel: delivery is
//! best-effort per observer, and an observer whose channel is closed or whose
//! buffer is full is removed from the set instead of stalling the publisher
//! or surfacing an error to it.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::vendor::VendorId;

/// Opaque identity of a connected observer.
pub type ObserverId = Uuid;

/// Default per-observer event buffer. A map client more than this many
/// events behind is treated as dead.
const DEFAULT_OBSERVER_BUFFER: usize = 32;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Event pushed to every connected observer.
///
/// Serializes as `{"vendor_id": N, "lat": x, "lng": y}` for position updates
/// and `{"vendor_id": N, "lat": null, "lng": null, "removed": true}` when a
/// vendor stops sharing. The shape matches already-deployed map clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    pub vendor_id: VendorId,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub removed: bool,
}

impl LiveEvent {
    /// A vendor moved to a new position.
    pub fn position(vendor_id: VendorId, lat: f64, lng: f64) -> Self {
        Self {
            vendor_id,
            lat: Some(lat),
            lng: Some(lng),
            removed: false,
        }
    }

    /// A vendor stopped sharing and should disappear from the map.
    pub fn vendor_removed(vendor_id: VendorId) -> Self {
        Self {
            vendor_id,
            lat: None,
            lng: None,
            removed: true,
        }
    }
}

/// The set of live observer connections.
pub struct LiveHub {
    observers: RwLock<HashMap<ObserverId, mpsc::Sender<LiveEvent>>>,
    buffer: usize,
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveHub {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_OBSERVER_BUFFER)
    }

    /// Create a hub with a custom per-observer buffer size (tests use tiny
    /// buffers to exercise the slow-consumer policy).
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            buffer,
        }
    }

    /// Register a new observer. The returned receiver yields every event
    /// published while the observer stays registered, in publish order.
    pub fn connect(&self) -> (ObserverId, mpsc::Receiver<LiveEvent>) {
        let id = Uuid::now_v7();
        let (tx, rx) = mpsc::channel(self.buffer);
        self.observers
            .write()
            .expect("observer set lock poisoned")
            .insert(id, tx);
        tracing::debug!(observer_id = %id, "observer connected");
        (id, rx)
    }

    /// Remove an observer from the active set. Idempotent.
    pub fn disconnect(&self, id: ObserverId) {
        let removed = self
            .observers
            .write()
            .expect("observer set lock poisoned")
            .remove(&id);
        if removed.is_some() {
            tracing::debug!(observer_id = %id, "observer disconnected");
        }
    }

    /// Deliver an event to every registered observer.
    ///
    /// Best-effort per connection: a closed receiver or a full buffer drops
    /// that observer from the set, and never prevents delivery to the others
    /// or raises an error to the caller. Returns the number of observers that
    /// received the event.
    pub fn publish(&self, event: &LiveEvent) -> usize {
        let mut dead = Vec::new();
        let mut delivered = 0;
        {
            let observers = self.observers.read().expect("observer set lock poisoned");
            for (id, tx) in observers.iter() {
                match tx.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Closed(_)) => dead.push(*id),
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(observer_id = %id, "observer buffer full, dropping it");
                        dead.push(*id);
                    }
                }
            }
        }

        if !dead.is_empty() {
            let mut observers = self.observers.write().expect("observer set lock poisoned");
            for id in dead {
                observers.remove(&id);
                tracing::debug!(observer_id = %id, "dead observer removed during publish");
            }
        }

        delivered
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .expect("observer set lock poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_event_wire_shape() {
        let event = LiveEvent::position(7, 5.5, -7.1);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"vendor_id": 7, "lat": 5.5, "lng": -7.1})
        );
    }

    #[test]
    fn removed_event_wire_shape() {
        let event = LiveEvent::vendor_removed(7);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"vendor_id": 7, "lat": null, "lng": null, "removed": true})
        );
    }

    #[tokio::test]
    async fn publish_reaches_every_observer_once() {
        let hub = LiveHub::new();
        let (_a, mut rx_a) = hub.connect();
        let (_b, mut rx_b) = hub.connect();
        let (_c, mut rx_c) = hub.connect();

        let event = LiveEvent::position(1, 1.0, 2.0);
        assert_eq!(hub.publish(&event), 3);

        for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
            assert_eq!(rx.recv().await.unwrap(), event);
            assert!(rx.try_recv().is_err(), "exactly one delivery per observer");
        }
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_and_stops_delivery() {
        let hub = LiveHub::new();
        let (a, _rx_a) = hub.connect();
        let (_b, mut rx_b) = hub.connect();
        let (_c, mut rx_c) = hub.connect();
        assert_eq!(hub.observer_count(), 3);

        hub.disconnect(a);
        hub.disconnect(a);
        assert_eq!(hub.observer_count(), 2);

        let event = LiveEvent::position(1, 3.0, 4.0);
        assert_eq!(hub.publish(&event), 2);
        assert_eq!(rx_b.recv().await.unwrap(), event);
        assert_eq!(rx_c.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn dropped_receiver_is_removed_on_next_publish() {
        let hub = LiveHub::new();
        let (_a, rx_a) = hub.connect();
        let (_b, mut rx_b) = hub.connect();
        drop(rx_a);

        let event = LiveEvent::position(2, 0.5, 0.5);
        assert_eq!(hub.publish(&event), 1);
        assert_eq!(hub.observer_count(), 1, "dead observer self-healed away");
        assert_eq!(rx_b.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn slow_observer_is_dropped_not_waited_for() {
        let hub = LiveHub::with_buffer(1);
        let (_slow, _rx_slow) = hub.connect();
        let (_live, mut rx_live) = hub.connect();

        // First event fills the slow observer's buffer (nobody drains it).
        hub.publish(&LiveEvent::position(1, 1.0, 1.0));
        assert_eq!(hub.observer_count(), 2);

        // Second publish finds the buffer full and drops the connection.
        hub.publish(&LiveEvent::position(1, 2.0, 2.0));
        assert_eq!(hub.observer_count(), 1);

        assert_eq!(rx_live.recv().await.unwrap(), LiveEvent::position(1, 1.0, 1.0));
        assert_eq!(rx_live.recv().await.unwrap(), LiveEvent::position(1, 2.0, 2.0));
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let hub = LiveHub::new();
        let (_id, mut rx) = hub.connect();

        for i in 0..5 {
            hub.publish(&LiveEvent::position(1, i as f64, 0.0));
        }
        for i in 0..5 {
            assert_eq!(rx.recv().await.unwrap().lat, Some(i as f64));
        }
    }
}
