//! Application state shared by all axum handlers.

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use serde::Deserialize;

use sunnytrack_lib::{
    AccessGate, InMemoryVendorDirectory, LiveHub, RouteTracker, Subscription, TokenCodec, Vendor,
    VendorDirectory, VendorId,
};

/// One vendor entry in the JSON seed file loaded at startup.
///
/// In production the directory is fed by the surrounding CRUD layer; the
/// seed file stands in for it in a single-process deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorSeed {
    pub id: VendorId,
    pub name: String,
    pub product: String,
    pub email: String,
    pub password: String,
    pub subscription: Subscription,
}

/// Errors raised while loading the vendor seed file.
#[derive(Debug)]
pub enum SeedError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for SeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read seed file: {e}"),
            Self::Parse(e) => write!(f, "failed to parse seed file: {e}"),
        }
    }
}

impl std::error::Error for SeedError {}

/// Shared application state for all handlers.
///
/// Cheaply cloneable (`Arc` internally); exactly one hub and one tracker
/// exist per server process, injected into handlers through axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    directory: Arc<InMemoryVendorDirectory>,
    tracker: RouteTracker,
    hub: LiveHub,
    gate: AccessGate,
    codec: TokenCodec,
    token_ttl: Duration,
}

impl AppState {
    /// Build the state from the token secret and ttl configured at startup.
    pub fn new(token_secret: impl Into<Vec<u8>>, token_ttl: Duration) -> Self {
        let directory = Arc::new(InMemoryVendorDirectory::new());
        let codec = TokenCodec::new(token_secret);
        let gate = AccessGate::new(
            codec.clone(),
            Arc::clone(&directory) as Arc<dyn VendorDirectory>,
        );
        let tracker = RouteTracker::new(Arc::clone(&directory) as Arc<dyn VendorDirectory>);

        Self {
            inner: Arc::new(AppStateInner {
                directory,
                tracker,
                hub: LiveHub::new(),
                gate,
                codec,
                token_ttl,
            }),
        }
    }

    /// Load vendor records from a JSON seed file into the directory.
    ///
    /// Returns the number of vendors loaded.
    pub fn seed_from_file(&self, path: impl AsRef<Path>) -> Result<usize, SeedError> {
        let raw = std::fs::read_to_string(path).map_err(SeedError::Io)?;
        let seeds: Vec<VendorSeed> = serde_json::from_str(&raw).map_err(SeedError::Parse)?;
        let count = seeds.len();
        for seed in seeds {
            self.add_vendor(seed);
        }
        Ok(count)
    }

    /// Register a single vendor record.
    pub fn add_vendor(&self, seed: VendorSeed) {
        self.inner.directory.add_vendor(
            Vendor {
                id: seed.id,
                name: seed.name,
                product: seed.product,
                current_lat: None,
                current_lng: None,
            },
            seed.email,
            seed.password,
            seed.subscription,
        );
    }

    pub fn directory(&self) -> &InMemoryVendorDirectory {
        &self.inner.directory
    }

    pub fn tracker(&self) -> &RouteTracker {
        &self.inner.tracker
    }

    pub fn hub(&self) -> &LiveHub {
        &self.inner.hub
    }

    pub fn gate(&self) -> &AccessGate {
        &self.inner.gate
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.inner.codec
    }

    pub fn token_ttl(&self) -> Duration {
        self.inner.token_ttl
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("vendor_count", &self.inner.directory.vendor_count())
            .field("observer_count", &self.inner.hub.observer_count())
            .finish()
    }
}
