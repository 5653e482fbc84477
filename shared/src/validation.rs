//! # Request Validation Helpers
//!
//! Utilities for validating incoming request data using the `validator` crate.
//!
//! ## Overview
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`validate_request`] | Validate a struct implementing `Validate` |
//! | [`parse_and_validate`] | Parse JSON and validate in one step |
//! | [`validators`] | Custom validation functions |
//!
//! ## How Validation Works
//!
//! We use the [`validator`](https://docs.rs/validator/) crate, which provides
//! derive macros for declarative validation on the request DTOs in
//! `authority-service::api::dto` (login bodies, switch-tenant bodies, and so on):
//!
//! ```rust,ignore
//! use validator::Validate;
//!
//! #[derive(Validate)]
//! struct LoginRequest {
//!     #[validate(custom(function = "validators::not_blank"))]
//!     account: String,
//!
//!     #[validate(custom(function = "validators::not_blank"))]
//!     password: String,
//! }
//! ```
//!
//! ## Error Response Format
//!
//! When validation fails, the API returns a 400 with field-level details
//! (`ApiError::Validation`, see [`crate::errors`]):
//!
//! ```json
//! {
//!   "code": "INVALID_PARAMETERS",
//!   "message": "account: Validation error: blank [{}]"
//! }
//! ```
//!
//! ## Related Documentation
//!
//! - [`validator` crate](https://docs.rs/validator/)
//! - [`crate::errors::ApiError`] - Error handling

use crate::errors::ApiError;
use serde::de::DeserializeOwned;
use validator::Validate;

// =============================================================================
// Core Validation Functions
// =============================================================================

/// Validates a request DTO that implements `Validate`.
///
/// Use this in handlers to validate incoming data before it reaches the
/// facade:
///
/// ```rust,ignore
/// async fn login(body: Json<LoginRequest>) -> Result<impl Responder, ApiError> {
///     validate_request(&body.0)?;
///     // continue with validated data
/// }
/// ```
///
/// ## Errors
///
/// Returns `ApiError::Validation` with field-level details if validation fails.
pub fn validate_request<T: Validate>(data: &T) -> Result<(), ApiError> {
    data.validate()?;
    Ok(())
}

/// Parses a JSON string and validates it in a single step.
///
/// ## Errors
///
/// - `ApiError::InvalidParameters` if JSON parsing fails
/// - `ApiError::Validation` if validation fails
pub fn parse_and_validate<T: DeserializeOwned + Validate>(json: &str) -> Result<T, ApiError> {
    let data: T = serde_json::from_str(json)
        .map_err(|e| ApiError::invalid_parameters(e.to_string()))?;

    validate_request(&data)?;

    Ok(data)
}

// =============================================================================
// Custom Validators
// =============================================================================

/// Custom validation functions for use with `#[validate(custom)]`.
///
/// These functions follow the validator crate's signature:
/// `fn(&T) -> Result<(), ValidationError>`
pub mod validators {
    use validator::ValidationError;

    /// Validates that a string is not blank (empty or whitespace-only).
    ///
    /// Used on the account/password/user-id fields accepted at the HTTP
    /// boundary — the token authority itself never inspects a password, but
    /// an empty one is rejected before the request reaches the Password
    /// Verifier Client.
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("blank"));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::validators::*;

    #[test]
    fn not_blank_accepts_non_empty_strings() {
        assert!(not_blank("hello").is_ok());
        assert!(not_blank("  hello  ").is_ok());
        assert!(not_blank("a").is_ok());
    }

    #[test]
    fn not_blank_rejects_empty_or_whitespace() {
        assert!(not_blank("").is_err());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("\t\n").is_err());
    }
}
