//! # Request Handlers
//!
//! HTTP request handlers that bridge the API layer with the Authority
//! Facade (C5). Each handler follows this pattern:
//!
//! 1. **Extract** request data using Actix extractors (JSON body, headers)
//! 2. **Validate** input using the `validator` crate, where a body exists
//! 3. **Call** the facade
//! 4. **Transform** the result into the response shape of §6
//!
//! ## Error Handling
//!
//! All handlers return `Result<HttpResponse, ApiError>`. `ApiError`
//! converts to the appropriate HTTP status via its `ResponseError` impl —
//! 401 for the four auth-failure kinds, 400 for malformed bodies, 200 for
//! a directory pass-through error (§7).
//!
//! ## Related Documentation
//!
//! - DTOs: [`super::dto`]
//! - Routes: [`super::routes`]
//! - Facade: [`crate::facade::AuthorityFacade`]
//! - Errors: [`shared::errors::ApiError`]

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use shared::{errors::ApiError, validation};
use tracing::{info, warn};

use crate::AppState;

use super::dto::{DestroyRequest, HealthResponse, LoginRequest, SwitchTenantRequest, TokenEnvelopeResponse};

/// Reads a header value as a `&str`, defaulting to empty when absent or
/// not valid UTF-8 — an absent credential is simply an invalid one, not a
/// malformed-request error (§7).
fn header_str<'a>(req: &'a HttpRequest, name: &str) -> &'a str {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

/// `GET /health` — liveness/readiness probe target (§1 out-of-scope
/// surface, kept as ambient plumbing rather than part of the token core).
pub async fn health_check() -> HttpResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: "authority-service".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

// =============================================================================
// LOGIN
// =============================================================================

/// `POST /login` — `{username, password, login_type}` → token envelope.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    validation::validate_request(&body.0)?;

    let envelope = state
        .facade
        .login(&body.username, &body.password, &body.login_type)
        .await?;

    info!(username = %body.username, "login succeeded");
    Ok(HttpResponse::Ok().json(TokenEnvelopeResponse::from(envelope)))
}

// =============================================================================
// LOGOUT
// =============================================================================

/// `POST /logout` — reads `Access-Token`; idempotent (§8 P6).
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let access = header_str(&req, "Access-Token");
    state.facade.logout(access).await?;
    Ok(HttpResponse::Ok().finish())
}

// =============================================================================
// REFRESH
// =============================================================================

/// `POST /refresh` — reads `Refresh-Token`; response shape matches Login.
pub async fn refresh(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let refresh = header_str(&req, "Refresh-Token");
    let envelope = state.facade.refresh(refresh).await?;
    Ok(HttpResponse::Ok().json(TokenEnvelopeResponse::from(envelope)))
}

// =============================================================================
// CHECK
// =============================================================================

/// `POST /check` — reads `Access-Token`; writes identity headers on
/// success, 401 on failure.
pub async fn check(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let access = header_str(&req, "Access-Token");
    let identity = state.facade.check(access).await?;

    Ok(HttpResponse::Ok()
        .insert_header(("User-Id", identity.user_id))
        .insert_header(("User-Name", identity.name))
        .insert_header(("Department-Id", identity.department_id))
        .insert_header(("Tenant-Id", identity.tenant_id))
        .finish())
}

// =============================================================================
// AUTH
// =============================================================================

/// `POST /auth` — signature-only verification + re-mint; reads `Access-Token`.
pub async fn auth(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let access = header_str(&req, "Access-Token");
    let envelope = state.facade.auth(access).await?;
    Ok(HttpResponse::Ok().json(TokenEnvelopeResponse::from(envelope)))
}

// =============================================================================
// DESTROY
// =============================================================================

/// `POST /destroy` — `{usersID:[…]}`, bulk revocation.
pub async fn destroy(
    state: web::Data<AppState>,
    body: web::Json<DestroyRequest>,
) -> Result<HttpResponse, ApiError> {
    validation::validate_request(&body.0)?;
    state.facade.destroy_by_user_id(&body.users_id).await?;
    Ok(HttpResponse::Ok().finish())
}

// =============================================================================
// SWITCH TENANT
// =============================================================================

/// `POST /switch/tenant` — `{tenantID}`, reads `Access-Token`.
pub async fn switch_tenant(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<SwitchTenantRequest>,
) -> Result<HttpResponse, ApiError> {
    validation::validate_request(&body.0)?;
    let access = header_str(&req, "Access-Token");
    state.facade.switch_tenant(access, &body.tenant_id).await?;
    Ok(HttpResponse::Ok().finish())
}

// =============================================================================
// AUTH CODER
// =============================================================================

/// `ANY /authCoder` — transparent reverse-proxy auth check for the
/// third-party web IDE handler named in §1's out-of-scope list; only the
/// yes/no signal is in scope here. Reads `X-Token`, always replies 200 with
/// `X-Auth: true|false` rather than a status code, so the proxy in front of
/// it can make its own routing decision.
pub async fn auth_coder(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let token = header_str(&req, "X-Token");
    let authorized = match state.facade.faas_check(token).await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "authCoder check failed");
            false
        }
    };
    HttpResponse::Ok()
        .insert_header(("X-Auth", authorized.to_string()))
        .finish()
}
