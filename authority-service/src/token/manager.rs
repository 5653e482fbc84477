//! C3 — Token Manager (§4.3): orchestrates Generate/Refresh/Load/Verify/Remove
//! on top of the Signed Access Generator (C1) and Token Store (C2).

use chrono::Utc;
use shared::config::JwtConfig;
use shared::errors::ApiError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::generator::{AccessClaims, GenerateBasic, SignedAccessGenerator};
use super::model::GrantEnvelope;
use super::store::TokenStore;

/// Token lifetimes and rotation behavior, derived from `JwtConfig` once at
/// startup (§9: explicit, injected, immutable — no process-global config).
#[derive(Debug, Clone)]
pub struct TokenManagerConfig {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub generate_refresh: bool,
    /// On Refresh, remove the prior access credential. Defaults on (§4.3).
    pub rotate_remove_old_access: bool,
    /// On Refresh, remove the prior refresh credential. Defaults on (§4.3).
    pub rotate_remove_old_refresh: bool,
    /// On Refresh, reset the grant's `refresh_created_at` to now.
    pub reset_refresh_time: bool,
}

impl From<&JwtConfig> for TokenManagerConfig {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            access_ttl: Duration::from_secs((cfg.access_token_exp.max(0) as u64) * 3600),
            refresh_ttl: Duration::from_secs((cfg.refresh_token_exp.max(0) as u64) * 3600),
            generate_refresh: cfg.generate_refresh,
            rotate_remove_old_access: true,
            rotate_remove_old_refresh: true,
            reset_refresh_time: true,
        }
    }
}

pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    generator: Arc<SignedAccessGenerator>,
    config: TokenManagerConfig,
}

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>, generator: Arc<SignedAccessGenerator>, config: TokenManagerConfig) -> Self {
        Self { store, generator, config }
    }

    /// Issues a fresh grant: new `basic_id`, access token, and (if
    /// configured) refresh token.
    pub async fn generate_access_token(
        &self,
        user_id: &str,
        other_info: Option<HashMap<String, String>>,
    ) -> Result<GrantEnvelope, ApiError> {
        let now = Utc::now();
        let basic = GenerateBasic {
            jti: user_id,
            expires_at: now + chrono::Duration::from_std(self.config.access_ttl).unwrap_or_default(),
            other_info: other_info.as_ref(),
        };
        let (access, refresh) = self.generator.token(&basic, self.config.generate_refresh)?;

        let envelope = GrantEnvelope {
            basic_id: String::new(),
            user_id: user_id.to_string(),
            access_token: access,
            access_created_at: now,
            access_ttl_secs: self.config.access_ttl.as_secs() as i64,
            refresh_token: refresh,
            refresh_created_at: now,
            refresh_ttl_secs: self.config.refresh_ttl.as_secs() as i64,
            other_info: other_info.unwrap_or_default(),
        };
        self.store.create(envelope).await
    }

    /// Mints a new access (and, if enabled, refresh) token reusing the
    /// grant's `basic_id`, then — per the default-on rotation flags —
    /// removes the superseded credentials (§4.3, §5).
    pub async fn refresh_access_token(&self, refresh: &str) -> Result<GrantEnvelope, ApiError> {
        let old = self.load_refresh_token(refresh).await?;
        let now = Utc::now();
        let other_info = if old.other_info.is_empty() { None } else { Some(&old.other_info) };
        let basic = GenerateBasic {
            jti: &old.user_id,
            expires_at: now + chrono::Duration::from_std(self.config.access_ttl).unwrap_or_default(),
            other_info,
        };
        let (access, refresh_token) = self.generator.token(&basic, self.config.generate_refresh)?;

        let new_envelope = GrantEnvelope {
            basic_id: old.basic_id.clone(),
            user_id: old.user_id.clone(),
            access_token: access,
            access_created_at: now,
            access_ttl_secs: self.config.access_ttl.as_secs() as i64,
            refresh_token,
            refresh_created_at: if self.config.reset_refresh_time { now } else { old.refresh_created_at },
            refresh_ttl_secs: self.config.refresh_ttl.as_secs() as i64,
            other_info: old.other_info.clone(),
        };
        let created = self.store.create(new_envelope).await?;

        if self.config.rotate_remove_old_access {
            self.store.remove_by_access(&old.access_token).await?;
        }
        if self.config.rotate_remove_old_refresh && old.has_refresh() {
            self.store.remove_by_refresh(&old.refresh_token).await?;
        }
        Ok(created)
    }

    /// The hot path: signature + claims check, then envelope lookup,
    /// presented-credential match, refresh expiry, then access expiry (§4.3).
    pub async fn load_access_token(&self, access: &str) -> Result<GrantEnvelope, ApiError> {
        if access.is_empty() {
            return Err(ApiError::InvalidAccessToken);
        }
        self.generator.verify(access)?;

        let envelope = self
            .store
            .get_by_access(access)
            .await?
            .ok_or(ApiError::InvalidAccessToken)?;
        if envelope.access_token != access {
            return Err(ApiError::InvalidAccessToken);
        }

        let now = Utc::now();
        if envelope.is_refresh_expired(now) {
            return Err(ApiError::ExpiredRefreshToken);
        }
        if envelope.is_access_expired(now) {
            return Err(ApiError::ExpiredAccessToken);
        }
        Ok(envelope)
    }

    /// Symmetrical to `load_access_token` but without the signature check —
    /// refresh tokens are opaque, not signed.
    pub async fn load_refresh_token(&self, refresh: &str) -> Result<GrantEnvelope, ApiError> {
        if refresh.is_empty() {
            return Err(ApiError::InvalidRefreshToken);
        }
        let envelope = self
            .store
            .get_by_refresh(refresh)
            .await?
            .ok_or(ApiError::InvalidRefreshToken)?;
        if envelope.refresh_token != refresh {
            return Err(ApiError::InvalidRefreshToken);
        }
        if envelope.is_refresh_expired(Utc::now()) {
            return Err(ApiError::ExpiredRefreshToken);
        }
        Ok(envelope)
    }

    /// Store-only lookup with no signature check — used by Logout and
    /// SwitchTenant, which the spec deliberately exempts from the crypto
    /// half of the two-stage check (§4.5, §9 Open Question 4).
    pub async fn find_by_access_unverified(&self, access: &str) -> Result<Option<GrantEnvelope>, ApiError> {
        if access.is_empty() {
            return Ok(None);
        }
        self.store.get_by_access(access).await
    }

    pub async fn remove_by_access(&self, access: &str) -> Result<(), ApiError> {
        if access.is_empty() {
            return Err(ApiError::InvalidAccessToken);
        }
        self.store.remove_by_access(access).await
    }

    pub async fn remove_by_refresh(&self, refresh: &str) -> Result<(), ApiError> {
        if refresh.is_empty() {
            return Err(ApiError::InvalidRefreshToken);
        }
        self.store.remove_by_refresh(refresh).await
    }

    /// Bulk revocation of every live grant for `user_id` (password reset,
    /// status change, explicit destroy).
    pub async fn remove_token(&self, user_id: &str) -> Result<(), ApiError> {
        self.store.remove_token(user_id).await
    }

    /// Signature-only verification, intentionally bypassing store
    /// revocation — used by `Auth`'s SSO re-mint path (§4.5, §9 Open
    /// Question 2).
    pub fn verify_token(&self, token: &str) -> Result<AccessClaims, ApiError> {
        if token.is_empty() {
            return Err(ApiError::InvalidAccessToken);
        }
        self.generator.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::store::fake::FakeTokenStore;
    use shared::config::SigningAlgorithm;

    fn manager(access_hours: i64, refresh_hours: i64) -> TokenManager {
        let jwt_cfg = JwtConfig {
            access_token_exp: access_hours,
            refresh_token_exp: refresh_hours,
            algorithm: SigningAlgorithm::HS256,
            jwt_key: "unit-test-signing-key-long-enough".to_string(),
            jwt_public_key: None,
            key_id: None,
            server_host: String::new(),
            generate_refresh: true,
        };
        let generator = Arc::new(SignedAccessGenerator::new(&jwt_cfg).unwrap());
        let store: Arc<dyn TokenStore> = Arc::new(FakeTokenStore::default());
        TokenManager::new(store, generator, TokenManagerConfig::from(&jwt_cfg))
    }

    #[tokio::test]
    async fn round_trip_generate_then_load() {
        let mgr = manager(2, 24);
        let envelope = mgr.generate_access_token("alice", None).await.unwrap();
        let loaded = mgr.load_access_token(&envelope.access_token).await.unwrap();
        assert_eq!(loaded.user_id, "alice");
        assert_eq!(loaded.basic_id, envelope.basic_id);
    }

    #[tokio::test]
    async fn revocation_after_remove_by_access() {
        let mgr = manager(2, 24);
        let envelope = mgr.generate_access_token("bob", None).await.unwrap();
        mgr.remove_by_access(&envelope.access_token).await.unwrap();
        let err = mgr.load_access_token(&envelope.access_token).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidAccessToken));
    }

    #[tokio::test]
    async fn rotation_invalidates_old_pair_and_keeps_new_one_live() {
        let mgr = manager(2, 24);
        let first = mgr.generate_access_token("carol", None).await.unwrap();
        let refreshed = mgr.refresh_access_token(&first.refresh_token).await.unwrap();

        assert_eq!(refreshed.basic_id, first.basic_id);
        assert!(matches!(
            mgr.load_access_token(&first.access_token).await.unwrap_err(),
            ApiError::InvalidAccessToken
        ));
        assert!(matches!(
            mgr.load_refresh_token(&first.refresh_token).await.unwrap_err(),
            ApiError::InvalidRefreshToken
        ));
        assert!(mgr.load_access_token(&refreshed.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn access_ttl_is_clamped_to_refresh_ttl() {
        // access configured longer than refresh: clamp brings it down (I3/P7).
        let mgr = manager(48, 2);
        let envelope = mgr.generate_access_token("dave", None).await.unwrap();
        assert!(envelope.access_ttl_secs <= envelope.refresh_ttl_secs);
    }

    #[tokio::test]
    async fn destroy_by_user_revokes_all_active_grants() {
        let mgr = manager(2, 24);
        let first = mgr.generate_access_token("erin", None).await.unwrap();
        let second = mgr.generate_access_token("erin", None).await.unwrap();

        mgr.remove_token("erin").await.unwrap();

        assert!(mgr.load_access_token(&first.access_token).await.is_err());
        assert!(mgr.load_access_token(&second.access_token).await.is_err());
    }

    #[tokio::test]
    async fn verify_token_succeeds_even_after_store_revocation() {
        let mgr = manager(2, 24);
        let envelope = mgr.generate_access_token("frank", None).await.unwrap();
        mgr.remove_by_access(&envelope.access_token).await.unwrap();

        // signature-only verification is unaffected by store-side revocation.
        let claims = mgr.verify_token(&envelope.access_token).unwrap();
        assert_eq!(claims.jti, "frank");
        assert!(mgr.load_access_token(&envelope.access_token).await.is_err());
    }
}
