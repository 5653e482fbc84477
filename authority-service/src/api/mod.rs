//! # API Layer
//!
//! The API layer handles HTTP request/response processing for the
//! authority service. It bridges the HTTP world with the Authority Facade
//! (C5) — every handler here is a thin adapter with no token-lifecycle
//! logic of its own.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            HTTP Request                                 │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Routes (routes.rs)                             │
//! │  Define URL patterns and HTTP methods, map to handlers                  │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Handlers (handlers.rs)                           │
//! │  1. Extract request data (JSON body, headers)                           │
//! │  2. Validate input using DTOs                                           │
//! │  3. Call the Authority Facade                                           │
//! │  4. Transform the result into the §6 response shape                     │
//! └───────────────────────────────┬─────────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          DTOs (dto.rs)                                  │
//! │  - Request validation (serde, validator)                                │
//! │  - Response serialization                                               │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Endpoint Summary
//!
//! | Method | Path                          | Handler          | Headers read     |
//! |--------|-------------------------------|------------------|-------------------|
//! | POST   | `/api/v1/warden/login`        | `login`          | —                 |
//! | POST   | `/api/v1/warden/logout`       | `logout`         | `Access-Token`    |
//! | POST   | `/api/v1/warden/refresh`      | `refresh`        | `Refresh-Token`   |
//! | POST   | `/api/v1/warden/check`        | `check`          | `Access-Token`    |
//! | POST   | `/api/v1/warden/auth`         | `auth`           | `Access-Token`    |
//! | POST   | `/api/v1/warden/destroy`      | `destroy`        | —                 |
//! | POST   | `/api/v1/warden/switch/tenant`| `switch_tenant`  | `Access-Token`    |
//! | ANY    | `/api/v1/warden/authCoder`    | `auth_coder`     | `X-Token`         |
//! | GET    | `/health`                     | `health_check`   | —                 |
//!
//! ## Related Documentation
//!
//! - Facade: [`crate::facade::AuthorityFacade`]
//! - Error responses: [`shared::errors::ApiError`]

pub mod dto;
pub mod handlers;
pub mod routes;
