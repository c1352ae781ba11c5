//! Request types and validation for the HTTP endpoints.

use serde::{Deserialize, Serialize};

use crate::problem::ProblemDetails;

/// Validation for request payloads.
///
/// Implementations return a `ProblemDetails` (boxed, to keep `Err` small)
/// describing the first violated rule.
pub trait Validate {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

/// Credentials presented to `POST /api/v1/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.email.trim().is_empty() {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'email' field is required and cannot be empty",
                request_id,
            )));
        }
        if self.password.is_empty() {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'password' field is required and cannot be empty",
                request_id,
            )));
        }
        Ok(())
    }
}

/// Position sample sent to `PUT /api/v1/vendors/{id}/location`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub lat: f64,
    pub lng: f64,
}

impl Validate for LocationUpdate {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'lat' field must be a finite number between -90 and 90",
                request_id,
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'lng' field must be a finite number between -180 and 180",
                request_id,
            )));
        }
        Ok(())
    }
}
