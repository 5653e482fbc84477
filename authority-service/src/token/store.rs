//! C2 — Token Store (§4.2): the replicated K/V layout of §3 correlating a
//! grant's access token, refresh token, and envelope under a freshly minted
//! `basic_id`, plus the per-user fan-out index used for bulk revocation.

use async_trait::async_trait;
use chrono::Utc;
use shared::errors::ApiError;
use shared::redis_client::RedisClient;
use std::time::Duration;
use uuid::Uuid;

use super::model::GrantEnvelope;

const JWT_PREFIX: &str = "jwt:";
const JWT_USERS_PREFIX: &str = "jwt:users:";

/// Capability abstraction over the grant store — a closed set of
/// implementations (Redis-backed in production, an in-memory fake in tests)
/// rather than a runtime plugin registry (§9).
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Mints a fresh `basic_id` (unless the caller already set one — Refresh
    /// reuses the prior grant's id per §4.3), clamps TTLs per §4.2, and
    /// commits entries 1–4 of §3 atomically. Returns the envelope with
    /// `basic_id` and clamped TTLs filled in.
    async fn create(&self, envelope: GrantEnvelope) -> Result<GrantEnvelope, ApiError>;

    async fn get_by_access(&self, access: &str) -> Result<Option<GrantEnvelope>, ApiError>;
    async fn get_by_refresh(&self, refresh: &str) -> Result<Option<GrantEnvelope>, ApiError>;

    /// Removes the access credential; drops the envelope only if the peer
    /// (refresh) credential is also gone (I4).
    async fn remove_by_access(&self, access: &str) -> Result<(), ApiError>;

    /// Removes the refresh credential; drops the envelope only if the peer
    /// (access) credential is also gone, then runs `clean_by_user` (I4).
    async fn remove_by_refresh(&self, refresh: &str) -> Result<(), ApiError>;

    /// Bulk revocation: removes every live grant for `user_id` via the
    /// per-user fan-out index.
    async fn remove_token(&self, user_id: &str) -> Result<(), ApiError>;
}

/// Redis-backed `TokenStore`, grounded on `original_source`'s
/// `pkg/jwts/store/redis.go`.
pub struct RedisTokenStore {
    redis: RedisClient,
    namespace: String,
}

impl RedisTokenStore {
    pub fn new(redis: RedisClient, namespace: impl Into<String>) -> Self {
        Self { redis, namespace: namespace.into() }
    }

    fn jwt_key(&self, suffix: &str) -> String {
        format!("{}{}{}", self.namespace, JWT_PREFIX, suffix)
    }

    fn users_key(&self, user_id: &str) -> String {
        format!("{}{}{}", self.namespace, JWT_USERS_PREFIX, user_id)
    }

    /// Drops per-user hash fields whose mapped access token no longer
    /// resolves, so bulk revocation stays O(active grants) over time.
    async fn clean_by_user(&self, user_id: &str) -> Result<(), ApiError> {
        let fields = self.redis.hgetall(&self.users_key(user_id)).await?;
        for (basic_id, access_token) in fields {
            if !self.redis.exists(&self.jwt_key(&access_token)).await? {
                self.redis.hdel(&self.users_key(user_id), &basic_id).await?;
            }
        }
        Ok(())
    }

    /// Shared body of `remove_by_access`/`remove_by_refresh`: resolve
    /// `basic_id` via the presented credential, delete that credential's
    /// key, and drop the envelope only if `peer` is already gone.
    async fn remove_credential(&self, credential: &str, peer: Option<&str>) -> Result<(), ApiError> {
        let basic_id = match self.redis.get_raw(&self.jwt_key(credential)).await? {
            Some(id) => id,
            None => return Ok(()),
        };
        self.redis.delete(&self.jwt_key(credential)).await?;

        let peer_live = match peer {
            Some(p) if !p.is_empty() => self.redis.exists(&self.jwt_key(p)).await?,
            _ => false,
        };
        if !peer_live {
            self.redis.delete(&self.jwt_key(&basic_id)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn create(&self, mut envelope: GrantEnvelope) -> Result<GrantEnvelope, ApiError> {
        let now = Utc::now();
        if envelope.basic_id.is_empty() {
            envelope.basic_id = Uuid::new_v4().to_string();
        }

        let mut access_ttl = envelope.access_ttl();
        let mut envelope_ttl = access_ttl;
        if envelope.has_refresh() {
            let remaining = envelope.refresh_expires_at() - now;
            envelope_ttl = Duration::from_secs(remaining.num_seconds().max(0) as u64);
            if access_ttl > envelope_ttl {
                access_ttl = envelope_ttl;
            }
        }
        envelope.access_ttl_secs = access_ttl.as_secs() as i64;
        envelope.refresh_ttl_secs = envelope_ttl.as_secs() as i64;

        let serialized = serde_json::to_string(&envelope)?;
        let users_key = self.users_key(&envelope.user_id);

        let mut pipe = redis::pipe();
        pipe.atomic();
        if envelope.has_refresh() {
            pipe.set_ex(self.jwt_key(&envelope.refresh_token), &envelope.basic_id, envelope_ttl.as_secs());
        }
        pipe.set_ex(self.jwt_key(&envelope.access_token), &envelope.basic_id, access_ttl.as_secs());
        pipe.set_ex(self.jwt_key(&envelope.basic_id), &serialized, envelope_ttl.as_secs().max(1));
        pipe.hset(&users_key, &envelope.basic_id, &envelope.access_token);
        pipe.expire(&users_key, envelope_ttl.as_secs() as i64);

        self.redis.execute_pipeline(&pipe).await?;
        Ok(envelope)
    }

    async fn get_by_access(&self, access: &str) -> Result<Option<GrantEnvelope>, ApiError> {
        match self.redis.get_raw(&self.jwt_key(access)).await? {
            Some(basic_id) => self.redis.get_json(&self.jwt_key(&basic_id)).await,
            None => Ok(None),
        }
    }

    async fn get_by_refresh(&self, refresh: &str) -> Result<Option<GrantEnvelope>, ApiError> {
        match self.redis.get_raw(&self.jwt_key(refresh)).await? {
            Some(basic_id) => self.redis.get_json(&self.jwt_key(&basic_id)).await,
            None => Ok(None),
        }
    }

    async fn remove_by_access(&self, access: &str) -> Result<(), ApiError> {
        let envelope = self.get_by_access(access).await?;
        let peer = envelope.as_ref().map(|e| e.refresh_token.clone());
        self.remove_credential(access, peer.as_deref()).await
    }

    async fn remove_by_refresh(&self, refresh: &str) -> Result<(), ApiError> {
        let envelope = self.get_by_refresh(refresh).await?;
        let peer = envelope.as_ref().map(|e| e.access_token.clone());
        self.remove_credential(refresh, peer.as_deref()).await?;
        if let Some(env) = envelope {
            self.clean_by_user(&env.user_id).await?;
        }
        Ok(())
    }

    async fn remove_token(&self, user_id: &str) -> Result<(), ApiError> {
        let fields = self.redis.hgetall(&self.users_key(user_id)).await?;
        for (basic_id, access_token) in fields {
            if let Some(envelope) = self.get_by_access(&access_token).await? {
                self.remove_by_access(&envelope.access_token).await?;
                if envelope.has_refresh() {
                    self.remove_by_refresh(&envelope.refresh_token).await?;
                }
            }
            self.redis.delete(&self.jwt_key(&basic_id)).await?;
            self.redis.hdel(&self.users_key(user_id), &basic_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod fake {
    //! In-memory `TokenStore` used to exercise the Token Manager's
    //! invariants (I1–I5) and §8's testable properties without a live Redis.

    use super::*;
    use std::collections::HashMap as Map;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Inner {
        by_credential: Map<String, String>, // access|refresh -> basic_id
        envelopes: Map<String, GrantEnvelope>, // basic_id -> envelope
        by_user: Map<String, Map<String, String>>, // user_id -> (basic_id -> access)
    }

    #[derive(Default)]
    pub struct FakeTokenStore {
        inner: Mutex<Inner>,
    }

    #[async_trait]
    impl TokenStore for FakeTokenStore {
        async fn create(&self, mut envelope: GrantEnvelope) -> Result<GrantEnvelope, ApiError> {
            let now = Utc::now();
            if envelope.basic_id.is_empty() {
                envelope.basic_id = Uuid::new_v4().to_string();
            }

            let mut access_ttl = envelope.access_ttl();
            if envelope.has_refresh() {
                let remaining = envelope.refresh_expires_at() - now;
                let envelope_ttl = Duration::from_secs(remaining.num_seconds().max(0) as u64);
                if access_ttl > envelope_ttl {
                    access_ttl = envelope_ttl;
                }
                envelope.refresh_ttl_secs = envelope_ttl.as_secs() as i64;
            } else {
                envelope.refresh_ttl_secs = access_ttl.as_secs() as i64;
            }
            envelope.access_ttl_secs = access_ttl.as_secs() as i64;

            let mut inner = self.inner.lock().await;
            if envelope.has_refresh() {
                inner.by_credential.insert(envelope.refresh_token.clone(), envelope.basic_id.clone());
            }
            inner.by_credential.insert(envelope.access_token.clone(), envelope.basic_id.clone());
            inner
                .by_user
                .entry(envelope.user_id.clone())
                .or_default()
                .insert(envelope.basic_id.clone(), envelope.access_token.clone());
            inner.envelopes.insert(envelope.basic_id.clone(), envelope.clone());
            Ok(envelope)
        }

        async fn get_by_access(&self, access: &str) -> Result<Option<GrantEnvelope>, ApiError> {
            let inner = self.inner.lock().await;
            Ok(inner
                .by_credential
                .get(access)
                .and_then(|id| inner.envelopes.get(id))
                .cloned())
        }

        async fn get_by_refresh(&self, refresh: &str) -> Result<Option<GrantEnvelope>, ApiError> {
            self.get_by_access(refresh).await
        }

        async fn remove_by_access(&self, access: &str) -> Result<(), ApiError> {
            let mut inner = self.inner.lock().await;
            let Some(basic_id) = inner.by_credential.remove(access) else { return Ok(()) };
            let peer_live = inner
                .envelopes
                .get(&basic_id)
                .map(|e| !e.refresh_token.is_empty() && inner.by_credential.contains_key(&e.refresh_token))
                .unwrap_or(false);
            if !peer_live {
                inner.envelopes.remove(&basic_id);
            }
            Ok(())
        }

        async fn remove_by_refresh(&self, refresh: &str) -> Result<(), ApiError> {
            let user_id = {
                let inner = self.inner.lock().await;
                inner
                    .by_credential
                    .get(refresh)
                    .and_then(|id| inner.envelopes.get(id))
                    .map(|e| e.user_id.clone())
            };
            {
                let mut inner = self.inner.lock().await;
                if let Some(basic_id) = inner.by_credential.remove(refresh) {
                    let peer_live = inner
                        .envelopes
                        .get(&basic_id)
                        .map(|e| inner.by_credential.contains_key(&e.access_token))
                        .unwrap_or(false);
                    if !peer_live {
                        inner.envelopes.remove(&basic_id);
                    }
                }
            }
            if let Some(uid) = user_id {
                self.clean_by_user(&uid).await;
            }
            Ok(())
        }

        async fn remove_token(&self, user_id: &str) -> Result<(), ApiError> {
            let fields: Vec<(String, String)> = {
                let inner = self.inner.lock().await;
                inner.by_user.get(user_id).cloned().unwrap_or_default().into_iter().collect()
            };
            for (basic_id, access) in fields {
                if let Some(envelope) = self.get_by_access(&access).await? {
                    self.remove_by_access(&envelope.access_token).await?;
                    if envelope.has_refresh() {
                        self.remove_by_refresh(&envelope.refresh_token).await?;
                    }
                }
                let mut inner = self.inner.lock().await;
                inner.envelopes.remove(&basic_id);
                if let Some(hash) = inner.by_user.get_mut(user_id) {
                    hash.remove(&basic_id);
                }
            }
            Ok(())
        }
    }

    impl FakeTokenStore {
        async fn clean_by_user(&self, user_id: &str) {
            let mut inner = self.inner.lock().await;
            let live: Vec<String> = match inner.by_user.get(user_id) {
                Some(hash) => hash
                    .iter()
                    .filter(|(_, access)| !inner.by_credential.contains_key(*access))
                    .map(|(basic_id, _)| basic_id.clone())
                    .collect(),
                None => Vec::new(),
            };
            if let Some(hash) = inner.by_user.get_mut(user_id) {
                for basic_id in live {
                    hash.remove(&basic_id);
                }
            }
        }

        pub async fn user_grant_count(&self, user_id: &str) -> usize {
            self.inner.lock().await.by_user.get(user_id).map(|h| h.len()).unwrap_or(0)
        }
    }
}
