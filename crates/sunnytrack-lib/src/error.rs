use thiserror::Error;

use crate::vendor::VendorId;

/// Convenient result alias for the SunnyTrack core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The token was structurally malformed or its claims failed to parse.
    #[error("invalid token")]
    InvalidToken,

    /// The token's HMAC signature did not match its payload.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token's expiry timestamp has passed.
    #[error("token expired")]
    TokenExpired,

    /// The caller is authenticated but not allowed to act on this resource.
    #[error("not authorized for this resource")]
    NotAuthorized,

    /// The vendor's subscription is inactive or has lapsed.
    #[error("subscription inactive for vendor {vendor_id}")]
    SubscriptionInactive { vendor_id: VendorId },

    /// A location update arrived while the vendor had no open route session.
    #[error("no active route session for vendor {vendor_id}")]
    NoActiveSession { vendor_id: VendorId },

    /// A stop request arrived while the vendor had no open route session.
    #[error("no open route session for vendor {vendor_id}")]
    NoOpenSession { vendor_id: VendorId },

    /// The referenced vendor does not exist in the directory.
    #[error("unknown vendor: {vendor_id}")]
    VendorNotFound { vendor_id: VendorId },
}
