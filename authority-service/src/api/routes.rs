//! # Route Configuration
//!
//! Defines URL patterns and maps them to handler functions, all under the
//! `/api/v1/warden` prefix named in §6.
//!
//! ## Route Structure
//!
//! ```text
//! /
//! ├── health                        GET  → health_check
//! │
//! └── api/v1/warden/
//!     ├── login                     POST → login
//!     ├── logout                    POST → logout
//!     ├── refresh                   POST → refresh
//!     ├── check                     POST → check
//!     ├── auth                      POST → auth
//!     ├── destroy                   POST → destroy
//!     ├── switch/tenant              POST → switch_tenant
//!     └── authCoder                 ANY  → auth_coder
//! ```
//!
//! ## Related Documentation
//!
//! - Handler implementations: [`super::handlers`]

use actix_web::web;

use super::handlers;

/// Configures all routes for the authority service.
///
/// Called from `main.rs` during app initialization:
///
/// ```rust,ignore
/// App::new()
///     .configure(routes::configure)
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // ─────────────────────────────────────────────────────────────────
        // Health Check
        // ─────────────────────────────────────────────────────────────────
        .route("/health", web::get().to(handlers::health_check))
        // ─────────────────────────────────────────────────────────────────
        // Authority API v1
        // ─────────────────────────────────────────────────────────────────
        .service(
            web::scope("/api/v1/warden")
                //
                // POST /api/v1/warden/login
                // Verifies credentials and issues an access/refresh pair.
                // Request: LoginRequest { username, password, login_type }
                // Response: TokenEnvelopeResponse { access_token, expiry, refresh_token }
                .route("/login", web::post().to(handlers::login))
                //
                // POST /api/v1/warden/logout
                // Revokes the grant behind the presented access token.
                // Headers: Access-Token
                .route("/logout", web::post().to(handlers::logout))
                //
                // POST /api/v1/warden/refresh
                // Rotates a grant from its refresh token.
                // Headers: Refresh-Token
                // Response: TokenEnvelopeResponse
                .route("/refresh", web::post().to(handlers::refresh))
                //
                // POST /api/v1/warden/check
                // Full two-stage validation; writes identity headers on success.
                // Headers: Access-Token
                // Response headers: User-Id, User-Name, Department-Id, Tenant-Id
                .route("/check", web::post().to(handlers::check))
                //
                // POST /api/v1/warden/auth
                // Signature-only verification + re-mint (SSO handoff).
                // Headers: Access-Token
                // Response: TokenEnvelopeResponse
                .route("/auth", web::post().to(handlers::auth))
                //
                // POST /api/v1/warden/destroy
                // Bulk revocation by user id.
                // Request: DestroyRequest { usersID: [...] }
                .route("/destroy", web::post().to(handlers::destroy))
                //
                // POST /api/v1/warden/switch/tenant
                // Overwrites the caller's selected-tenant cache entry.
                // Headers: Access-Token
                // Request: SwitchTenantRequest { tenantID }
                .route("/switch/tenant", web::post().to(handlers::switch_tenant))
                //
                // ANY /api/v1/warden/authCoder
                // Yes/no proxy-auth check for the third-party web IDE handler.
                // Headers: X-Token
                // Response headers: X-Auth: true|false (always 200)
                .route("/authCoder", web::route().to(handlers::auth_coder)),
        );
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #[test]
    fn test_route_configuration_compiles() {
        assert!(true);
    }
}
