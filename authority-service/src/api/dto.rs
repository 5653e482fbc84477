//! # Data Transfer Objects (DTOs)
//!
//! DTOs define the structure of data transferred between client and server.
//! They serve as the **API contract** and handle:
//!
//! - **Request validation**: Using the `validator` crate
//! - **Deserialization**: JSON → Rust structs via `serde`
//! - **Serialization**: Rust structs → JSON for responses
//!
//! ## DTO Categories
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              DTOs                                       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Request DTOs (input)              Response DTOs (output)               │
//! │  ───────────────────               ─────────────────────                │
//! │  - LoginRequest                    - TokenEnvelopeResponse               │
//! │  - DestroyRequest                  - HealthResponse                      │
//! │  - SwitchTenantRequest                                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## JSON Naming Convention
//!
//! Request bodies mirror the wire shapes named in §6 literally rather than
//! following a blanket camelCase rule: `login_type` stays snake_case,
//! `users_id` is carried as `usersID`, `tenant_id` as `tenantID` — matching
//! `original_source`'s JSON tags field-by-field.
//!
//! ## Related Documentation
//!
//! - Validation module: [`shared::validation`]
//! - API handlers: [`super::handlers`]

use serde::{Deserialize, Serialize};
use validator::Validate;

// =============================================================================
// LOGIN
// =============================================================================

/// Request body for `POST /login`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "shared::validation::validators::not_blank"))]
    pub username: String,

    #[validate(custom(function = "shared::validation::validators::not_blank"))]
    pub password: String,

    #[validate(custom(function = "shared::validation::validators::not_blank"))]
    pub login_type: String,
}

/// `{access_token, expiry, refresh_token}` — returned by Login, Refresh, and Auth (§6).
/// `expiry` is the absolute unix-seconds instant the access token expires, not a TTL.
#[derive(Debug, Clone, Serialize)]
pub struct TokenEnvelopeResponse {
    pub access_token: String,
    pub expiry: i64,
    pub refresh_token: String,
}

impl From<crate::facade::TokenEnvelopeView> for TokenEnvelopeResponse {
    fn from(view: crate::facade::TokenEnvelopeView) -> Self {
        Self {
            access_token: view.access_token,
            expiry: view.expiry,
            refresh_token: view.refresh_token,
        }
    }
}

// =============================================================================
// DESTROY
// =============================================================================

/// Request body for `POST /destroy`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DestroyRequest {
    #[serde(rename = "usersID")]
    #[validate(length(min = 1, message = "usersID must not be empty"))]
    pub users_id: Vec<String>,
}

// =============================================================================
// SWITCH TENANT
// =============================================================================

/// Request body for `POST /switch/tenant`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SwitchTenantRequest {
    #[serde(rename = "tenantID")]
    #[validate(custom(function = "shared::validation::validators::not_blank"))]
    pub tenant_id: String,
}

// =============================================================================
// HEALTH
// =============================================================================

/// `GET /health` response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn login_request_rejects_blank_fields() {
        let req = LoginRequest {
            username: "alice".into(),
            password: "".into(),
            login_type: "passwd".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn destroy_request_deserializes_usersid_key() {
        let parsed: DestroyRequest = serde_json::from_str(r#"{"usersID":["a","b"]}"#).unwrap();
        assert_eq!(parsed.users_id, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn switch_tenant_request_deserializes_tenantid_key() {
        let parsed: SwitchTenantRequest = serde_json::from_str(r#"{"tenantID":"t-1"}"#).unwrap();
        assert_eq!(parsed.tenant_id, "t-1");
    }
}
