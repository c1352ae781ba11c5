//! The seam towards the surrounding CRUD layer.
//!
//! The core does not own vendor lifecycle: registration, profile edits,
//! reviews, and payment bookkeeping all live elsewhere. What the core needs
//! is a lookup-by-id capability, a subscription status, and permission to
//! update two fields of the vendor record (its current position). That
//! surface is the [`VendorDirectory`] trait.
//!
//! [`InMemoryVendorDirectory`] is the single-process implementation used by
//! the service binary and by tests.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vendor identity, assigned by the surrounding layer.
pub type VendorId = u64;

/// The slice of a vendor record the core reads and partially updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    /// What the vendor sells, shown on the map popup.
    pub product: String,
    /// Last reported latitude; absent when the vendor is not sharing.
    pub current_lat: Option<f64>,
    /// Last reported longitude; absent when the vendor is not sharing.
    pub current_lng: Option<f64>,
}

/// Subscription state gating paid features (live location sharing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub active: bool,
    pub expires_at: DateTime<Utc>,
}

/// Vendor lookup and position update capability consumed from the
/// surrounding CRUD layer.
pub trait VendorDirectory: Send + Sync {
    /// Fetch a vendor record by id.
    fn vendor(&self, id: VendorId) -> Option<Vendor>;

    /// Fetch the vendor's subscription status.
    fn subscription(&self, id: VendorId) -> Option<Subscription>;

    /// Record the vendor's current position on the live map.
    fn set_position(&self, id: VendorId, lat: f64, lng: f64);

    /// Remove the vendor from the live map (position becomes absent, not
    /// zero).
    fn clear_position(&self, id: VendorId);

    /// Flip the subscription flag off after its expiry has lapsed. Called
    /// lazily from the access gate at the moment the gate check observes the
    /// expiry.
    fn mark_subscription_expired(&self, id: VendorId);

    /// Check login credentials and resolve the owning vendor id. Password
    /// hashing policy belongs to the surrounding layer.
    fn authenticate(&self, email: &str, password: &str) -> Option<VendorId>;
}

struct VendorRecord {
    vendor: Vendor,
    email: String,
    password: String,
    subscription: Subscription,
}

/// Single-process directory backed by a `HashMap`.
#[derive(Default)]
pub struct InMemoryVendorDirectory {
    records: RwLock<HashMap<VendorId, VendorRecord>>,
}

impl InMemoryVendorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vendor record. Replaces any existing record with the same
    /// id.
    pub fn add_vendor(
        &self,
        vendor: Vendor,
        email: impl Into<String>,
        password: impl Into<String>,
        subscription: Subscription,
    ) {
        let mut records = self.records.write().expect("directory lock poisoned");
        records.insert(
            vendor.id,
            VendorRecord {
                vendor,
                email: email.into(),
                password: password.into(),
                subscription,
            },
        );
    }

    /// All vendor records, for the public map-bootstrap listing.
    pub fn vendors(&self) -> Vec<Vendor> {
        let records = self.records.read().expect("directory lock poisoned");
        let mut vendors: Vec<Vendor> = records.values().map(|r| r.vendor.clone()).collect();
        vendors.sort_by_key(|v| v.id);
        vendors
    }

    pub fn vendor_count(&self) -> usize {
        self.records.read().expect("directory lock poisoned").len()
    }
}

impl VendorDirectory for InMemoryVendorDirectory {
    fn vendor(&self, id: VendorId) -> Option<Vendor> {
        let records = self.records.read().expect("directory lock poisoned");
        records.get(&id).map(|r| r.vendor.clone())
    }

    fn subscription(&self, id: VendorId) -> Option<Subscription> {
        let records = self.records.read().expect("directory lock poisoned");
        records.get(&id).map(|r| r.subscription)
    }

    fn set_position(&self, id: VendorId, lat: f64, lng: f64) {
        let mut records = self.records.write().expect("directory lock poisoned");
        if let Some(record) = records.get_mut(&id) {
            record.vendor.current_lat = Some(lat);
            record.vendor.current_lng = Some(lng);
        }
    }

    fn clear_position(&self, id: VendorId) {
        let mut records = self.records.write().expect("directory lock poisoned");
        if let Some(record) = records.get_mut(&id) {
            record.vendor.current_lat = None;
            record.vendor.current_lng = None;
        }
    }

    fn mark_subscription_expired(&self, id: VendorId) {
        let mut records = self.records.write().expect("directory lock poisoned");
        if let Some(record) = records.get_mut(&id) {
            record.subscription.active = false;
            tracing::info!(vendor_id = id, "subscription lapsed, flag flipped off");
        }
    }

    fn authenticate(&self, email: &str, password: &str) -> Option<VendorId> {
        let records = self.records.read().expect("directory lock poisoned");
        records
            .values()
            .find(|r| r.email == email && r.password == password)
            .map(|r| r.vendor.id)
    }
}
