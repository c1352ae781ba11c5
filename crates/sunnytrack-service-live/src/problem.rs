//! RFC 9457 Problem Details responses.
//!
//! Every failure leaving the service is a `application/problem+json` body
//! with a stable `type` URI, so map clients and the CRUD layer can branch on
//! failure class instead of parsing prose.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use sunnytrack_lib::Error as CoreError;

/// Authentication failed: missing, malformed, tampered, or expired token.
pub const PROBLEM_UNAUTHORIZED: &str = "/problems/unauthorized";

/// Authenticated, but the subject does not own the target resource.
pub const PROBLEM_NOT_AUTHORIZED: &str = "/problems/not-authorized";

/// Authenticated and owning, but the subscription gate rejected the write.
pub const PROBLEM_SUBSCRIPTION_INACTIVE: &str = "/problems/subscription-inactive";

/// Route state machine precondition violated (no open session).
pub const PROBLEM_ROUTE_STATE: &str = "/problems/route-state";

/// The referenced vendor does not exist.
pub const PROBLEM_VENDOR_NOT_FOUND: &str = "/problems/vendor-not-found";

/// Request payload failed validation.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Unexpected server-side failure.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// RFC 9457 Problem Details response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem class.
    pub title: String,

    /// HTTP status code for this problem.
    pub status: u16,

    /// Explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Request correlation id for tracing this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// 401 for any authentication failure, including a missing bearer token.
    pub fn unauthorized(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(PROBLEM_UNAUTHORIZED, "Unauthorized", StatusCode::UNAUTHORIZED)
            .with_detail(detail)
            .with_request_id(request_id)
    }

    /// 400 for invalid request payloads.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// 500 for unexpected failures.
    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.detail.as_deref().unwrap_or(""))
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        *response.status_mut() = status;
        response
    }
}

/// Map core library errors onto the HTTP error taxonomy.
///
/// Authentication failures all surface as 401; ownership and subscription
/// rejections as 403 with distinct problem types; state machine violations
/// as 400; an unknown vendor as 404.
pub fn from_core_error(error: &CoreError, request_id: &str) -> ProblemDetails {
    match error {
        CoreError::InvalidToken | CoreError::InvalidSignature | CoreError::TokenExpired => {
            ProblemDetails::unauthorized(error.to_string(), request_id)
        }
        CoreError::NotAuthorized => ProblemDetails::new(
            PROBLEM_NOT_AUTHORIZED,
            "Not Authorized",
            StatusCode::FORBIDDEN,
        )
        .with_detail(error.to_string())
        .with_request_id(request_id),
        CoreError::SubscriptionInactive { .. } => ProblemDetails::new(
            PROBLEM_SUBSCRIPTION_INACTIVE,
            "Subscription Inactive",
            StatusCode::FORBIDDEN,
        )
        .with_detail(error.to_string())
        .with_request_id(request_id),
        CoreError::NoActiveSession { .. } | CoreError::NoOpenSession { .. } => {
            ProblemDetails::new(PROBLEM_ROUTE_STATE, "No Open Route", StatusCode::BAD_REQUEST)
                .with_detail(error.to_string())
                .with_request_id(request_id)
        }
        CoreError::VendorNotFound { .. } => ProblemDetails::new(
            PROBLEM_VENDOR_NOT_FOUND,
            "Vendor Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail(error.to_string())
        .with_request_id(request_id),
    }
}
