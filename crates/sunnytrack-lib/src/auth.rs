//! Access gate for mutating calls.
//!
//! Composes the token codec with the vendor directory: a write against a
//! vendor resource must present a valid vendor token whose subject owns the
//! target vendor, and location or route mutations additionally require the
//! vendor's subscription to still be active.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::token::{Claims, SubjectKind, TokenCodec};
use crate::vendor::{Vendor, VendorDirectory, VendorId};

/// Authorizes mutating calls against vendor-scoped resources.
pub struct AccessGate {
    codec: TokenCodec,
    directory: Arc<dyn VendorDirectory>,
}

impl AccessGate {
    pub fn new(codec: TokenCodec, directory: Arc<dyn VendorDirectory>) -> Self {
        Self { codec, directory }
    }

    /// Verify the bearer token and confirm the subject owns `vendor_id`.
    ///
    /// Returns the vendor record on success so callers skip a second lookup.
    pub fn authorize_vendor(&self, token: &str, vendor_id: VendorId) -> Result<Vendor> {
        self.authorize_vendor_at(token, vendor_id, Utc::now())
    }

    /// Ownership check against an explicit clock reading.
    pub fn authorize_vendor_at(
        &self,
        token: &str,
        vendor_id: VendorId,
        now: DateTime<Utc>,
    ) -> Result<Vendor> {
        let claims = self.codec.verify_at(token, now)?;
        self.check_ownership(&claims, vendor_id)?;

        self.directory
            .vendor(vendor_id)
            .ok_or(Error::VendorNotFound { vendor_id })
    }

    /// Ownership check plus the subscription gate used by state-mutating
    /// location and route operations.
    ///
    /// A subscription flagged active but past its expiry is lazily flipped
    /// off here, at the moment the gate observes it. This is deliberate
    /// policy rather than a scheduled sweep: the flag changes exactly when a
    /// write attempt hits the gate.
    pub fn authorize_subscribed_vendor(&self, token: &str, vendor_id: VendorId) -> Result<Vendor> {
        self.authorize_subscribed_vendor_at(token, vendor_id, Utc::now())
    }

    /// Subscription-gated authorization against an explicit clock reading.
    pub fn authorize_subscribed_vendor_at(
        &self,
        token: &str,
        vendor_id: VendorId,
        now: DateTime<Utc>,
    ) -> Result<Vendor> {
        let vendor = self.authorize_vendor_at(token, vendor_id, now)?;

        let subscription = self
            .directory
            .subscription(vendor_id)
            .ok_or(Error::SubscriptionInactive { vendor_id })?;

        if !subscription.active {
            return Err(Error::SubscriptionInactive { vendor_id });
        }
        if subscription.expires_at <= now {
            self.directory.mark_subscription_expired(vendor_id);
            return Err(Error::SubscriptionInactive { vendor_id });
        }

        Ok(vendor)
    }

    fn check_ownership(&self, claims: &Claims, vendor_id: VendorId) -> Result<()> {
        if claims.kind != SubjectKind::Vendor {
            return Err(Error::NotAuthorized);
        }
        if claims.sub != vendor_id {
            tracing::warn!(
                subject = claims.sub,
                vendor_id,
                "token subject attempted to mutate another vendor"
            );
            return Err(Error::NotAuthorized);
        }
        Ok(())
    }
}
