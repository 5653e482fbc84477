//! C5 — Authority Facade (§4.5): the public surface consumed by the HTTP
//! layer. Composes the Token Manager (C3), Identity Cache (C4), and the
//! Password Verifier Client (C7); the Directory Client (C6) is reached only
//! through the Identity Cache.

use shared::errors::ApiError;
use std::collections::HashMap;
use std::sync::Arc;

use crate::clients::password_verifier::PasswordVerifierClient;
use crate::identity::IdentityCache;
use crate::token::{GrantEnvelope, TokenManager};

/// `{access_token, expiry, refresh_token}` returned by Login/Refresh/Auth (§6).
///
/// `expiry` is the absolute instant the access token expires (unix seconds),
/// not a TTL — matching `original_source`'s `GetTokenData`, which emits
/// `time.Now().Add(ti.GetAccessExpiresIn())`.
#[derive(Debug, Clone)]
pub struct TokenEnvelopeView {
    pub access_token: String,
    pub expiry: i64,
    pub refresh_token: String,
}

impl From<GrantEnvelope> for TokenEnvelopeView {
    fn from(envelope: GrantEnvelope) -> Self {
        let expiry = envelope.access_expires_at().timestamp();
        Self {
            access_token: envelope.access_token,
            expiry,
            refresh_token: envelope.refresh_token,
        }
    }
}

/// Identity returned by Check; the HTTP layer writes these fields into the
/// `User-Id`/`User-Name`/`Department-Id`/`Tenant-Id` response headers.
#[derive(Debug, Clone)]
pub struct CheckedIdentity {
    pub user_id: String,
    pub name: String,
    pub department_id: String,
    pub tenant_id: String,
}

pub struct AuthorityFacade {
    manager: Arc<TokenManager>,
    identity: Arc<IdentityCache>,
    password_verifier: Arc<PasswordVerifierClient>,
}

impl AuthorityFacade {
    pub fn new(
        manager: Arc<TokenManager>,
        identity: Arc<IdentityCache>,
        password_verifier: Arc<PasswordVerifierClient>,
    ) -> Self {
        Self { manager, identity, password_verifier }
    }

    /// Verify credentials, mint a grant, and drop any stale tenant
    /// selection so the next Check falls back to the directory (§4.5).
    pub async fn login(&self, username: &str, password: &str, login_type: &str) -> Result<TokenEnvelopeView, ApiError> {
        let user_id = self.password_verifier.verify(username, password, login_type).await?;
        let envelope = self.manager.generate_access_token(&user_id, None).await?;
        self.identity.clear_tenant(&user_id).await?;
        Ok(envelope.into())
    }

    /// Store-only revocation of both credentials and the envelope;
    /// idempotent — an unresolvable or already-removed access token is
    /// treated as already logged out (§4.5, §8 P6).
    pub async fn logout(&self, access: &str) -> Result<(), ApiError> {
        let Some(envelope) = self.manager.find_by_access_unverified(access).await? else {
            return Ok(());
        };
        self.manager.remove_by_access(&envelope.access_token).await?;
        if envelope.has_refresh() {
            self.manager.remove_by_refresh(&envelope.refresh_token).await?;
        }
        Ok(())
    }

    pub async fn refresh(&self, refresh: &str) -> Result<TokenEnvelopeView, ApiError> {
        let envelope = self.manager.refresh_access_token(refresh).await?;
        Ok(envelope.into())
    }

    /// The gated-request hot path: full two-stage validation, then identity
    /// lookup. Directory failures fail closed as *invalid access token*
    /// rather than *internal* (§7).
    pub async fn check(&self, access: &str) -> Result<CheckedIdentity, ApiError> {
        let envelope = self.manager.load_access_token(access).await?;
        let identity = self
            .identity
            .get(&envelope.user_id)
            .await
            .map_err(|_| ApiError::InvalidAccessToken)?;
        Ok(CheckedIdentity {
            user_id: envelope.user_id,
            name: identity.name,
            department_id: identity.department_path,
            tenant_id: identity.current_tenant_id,
        })
    }

    /// Signature-only verification, then a fresh re-mint carrying the
    /// user's current name/department in `other_info` — accepts a
    /// store-revoked-but-cryptographically-valid token by design (§4.5,
    /// §9 Open Question 2, Scenario S6).
    pub async fn auth(&self, token: &str) -> Result<TokenEnvelopeView, ApiError> {
        let claims = self.manager.verify_token(token).map_err(|_| ApiError::InvalidAccessToken)?;
        let user_id = claims.jti;
        let identity = self
            .identity
            .get(&user_id)
            .await
            .map_err(|_| ApiError::InvalidAccessToken)?;

        let mut other_info = HashMap::new();
        other_info.insert("Department-Id".to_string(), identity.department_path);
        other_info.insert("User-Name".to_string(), identity.name);

        let envelope = self
            .manager
            .generate_access_token(&user_id, Some(other_info))
            .await
            .map_err(|_| ApiError::InvalidAccessToken)?;
        Ok(envelope.into())
    }

    /// Yes/no signal for the FaaS gateway — full validation, no identity
    /// lookup (§4.5).
    pub async fn faas_check(&self, token: &str) -> Result<(), ApiError> {
        self.manager.load_access_token(token).await?;
        Ok(())
    }

    pub async fn destroy_by_user_id(&self, user_ids: &[String]) -> Result<(), ApiError> {
        for user_id in user_ids {
            self.manager.remove_token(user_id).await?;
            self.identity.invalidate(user_id).await?;
        }
        Ok(())
    }

    /// No crypto check — access was already validated against Check in the
    /// same request cycle, and no tenant-authority validation is performed
    /// (§4.5, §9 Open Question 3).
    pub async fn switch_tenant(&self, access: &str, tenant_id: &str) -> Result<(), ApiError> {
        let envelope = self
            .manager
            .find_by_access_unverified(access)
            .await?
            .ok_or(ApiError::InvalidAccessToken)?;
        self.identity.set_tenant(&envelope.user_id, tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn token_envelope_view_reports_absolute_expiry_not_ttl() {
        let now = Utc::now();
        let envelope = GrantEnvelope {
            basic_id: "b1".into(),
            user_id: "u1".into(),
            access_token: "a1".into(),
            access_created_at: now,
            access_ttl_secs: 7200,
            refresh_token: "r1".into(),
            refresh_created_at: now,
            refresh_ttl_secs: 86400,
            other_info: HashMap::new(),
        };
        let view = TokenEnvelopeView::from(envelope);

        // An absolute instant ~2h out, not the bare TTL of 7200.
        assert_eq!(view.expiry, (now.timestamp() + 7200));
        assert!(view.expiry > now.timestamp() + 7000);
    }
}
