//! Compact signed bearer tokens.
//!
//! A token is three `.`-joined unpadded URL-safe base64 segments: a fixed
//! header, a claims document, and an HMAC-SHA256 signature computed over
//! `header + "." + claims` with a server-held secret. Any process holding the
//! secret can verify a token without a database round trip, which matters
//! because verification happens on every write.
//!
//! There is no refresh mechanism; issuing a new token is the only renewal
//! path.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};
use crate::vendor::VendorId;

type HmacSha256 = Hmac<Sha256>;

/// Role carried by a token subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    /// A vendor sharing its position; may mutate its own resources.
    Vendor,
    /// A consumer-facing client account; read-only towards vendor state.
    Client,
}

/// Fixed token header, serialized into the first segment.
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

impl Header {
    fn hs256() -> Self {
        Self {
            alg: "HS256",
            typ: "JWT",
        }
    }
}

/// Claims carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity (vendor or client id).
    pub sub: VendorId,
    /// Subject role.
    pub kind: SubjectKind,
    /// Absolute expiry, Unix seconds.
    pub exp: i64,
}

/// Issues and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl TokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a token for `subject_id` expiring `ttl` from now.
    pub fn issue(&self, subject_id: VendorId, kind: SubjectKind, ttl: Duration) -> String {
        self.issue_at(subject_id, kind, ttl, Utc::now())
    }

    /// Issue a token with an explicit issue time. Deterministic, used by
    /// expiry tests.
    pub fn issue_at(
        &self,
        subject_id: VendorId,
        kind: SubjectKind,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> String {
        let claims = Claims {
            sub: subject_id,
            kind,
            exp: issued_at.timestamp() + ttl.num_seconds(),
        };

        // Serializing fixed structs cannot fail.
        let header_json =
            serde_json::to_vec(&Header::hs256()).expect("header serialization is infallible");
        let claims_json = serde_json::to_vec(&claims).expect("claims serialization is infallible");

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.sign(signing_input.as_bytes());

        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
    }

    /// Verify a token against the current server clock.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against an explicit clock reading.
    ///
    /// The signature is checked (in constant time) before the claims are
    /// parsed, so a tampered claims segment fails as [`Error::InvalidSignature`]
    /// rather than leaking parse behavior.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let segments: Vec<&str> = token.split('.').collect();
        let (header, claims, signature) = match segments.as_slice() {
            [header, claims, signature] => (*header, *claims, *signature),
            _ => return Err(Error::InvalidToken),
        };

        let signing_input = format!("{header}.{claims}");
        let expected = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| Error::InvalidSignature)?;
        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| Error::InvalidSignature)?;

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|_| Error::InvalidToken)?;
        let claims: Claims =
            serde_json::from_slice(&claims_json).map_err(|_| Error::InvalidToken)?;

        if now.timestamp() >= claims.exp {
            return Err(Error::TokenExpired);
        }

        Ok(claims)
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC-SHA256 accepts keys of any length")
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret.
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret".to_vec())
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn issued_token_has_three_segments() {
        let token = codec().issue_at(7, SubjectKind::Vendor, Duration::hours(1), t0());
        assert_eq!(token.split('.').count(), 3);
        // Unpadded URL-safe alphabet only.
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn verify_roundtrip_returns_claims() {
        let codec = codec();
        let token = codec.issue_at(42, SubjectKind::Vendor, Duration::hours(1), t0());
        let claims = codec.verify_at(&token, t0()).expect("token verifies");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.kind, SubjectKind::Vendor);
        assert_eq!(claims.exp, t0().timestamp() + 3600);
    }

    #[test]
    fn verify_succeeds_within_ttl_window() {
        let codec = codec();
        let ttl = Duration::seconds(600);
        let token = codec.issue_at(1, SubjectKind::Vendor, ttl, t0());

        assert!(codec.verify_at(&token, t0()).is_ok());
        assert!(codec
            .verify_at(&token, t0() + Duration::seconds(599))
            .is_ok());
    }

    #[test]
    fn verify_fails_at_and_after_expiry() {
        let codec = codec();
        let ttl = Duration::seconds(600);
        let token = codec.issue_at(1, SubjectKind::Vendor, ttl, t0());

        assert_eq!(
            codec.verify_at(&token, t0() + ttl),
            Err(Error::TokenExpired)
        );
        assert_eq!(
            codec.verify_at(&token, t0() + Duration::days(2)),
            Err(Error::TokenExpired)
        );
    }

    #[test]
    fn wrong_segment_count_is_invalid() {
        let codec = codec();
        assert_eq!(codec.verify("nonsense"), Err(Error::InvalidToken));
        assert_eq!(codec.verify("a.b"), Err(Error::InvalidToken));
        assert_eq!(codec.verify("a.b.c.d"), Err(Error::InvalidToken));
    }

    #[test]
    fn wrong_secret_fails_signature_check() {
        let token = codec().issue_at(1, SubjectKind::Vendor, Duration::hours(1), t0());
        let other = TokenCodec::new(b"another-secret".to_vec());
        assert_eq!(other.verify_at(&token, t0()), Err(Error::InvalidSignature));
    }

    #[test]
    fn any_single_byte_mutation_is_rejected() {
        let codec = codec();
        let token = codec.issue_at(9, SubjectKind::Vendor, Duration::hours(1), t0());

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            // Flip within the base64 alphabet so the mutation survives parsing.
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let Ok(mutated) = String::from_utf8(bytes) else {
                continue;
            };
            if mutated == token {
                continue;
            }
            let result = codec.verify_at(&mutated, t0());
            assert!(
                matches!(result, Err(Error::InvalidToken) | Err(Error::InvalidSignature)),
                "mutation at byte {i} unexpectedly yielded {result:?}"
            );
        }
    }

    #[test]
    fn client_kind_roundtrips() {
        let codec = codec();
        let token = codec.issue_at(5, SubjectKind::Client, Duration::hours(1), t0());
        let claims = codec.verify_at(&token, t0()).expect("token verifies");
        assert_eq!(claims.kind, SubjectKind::Client);
    }
}
