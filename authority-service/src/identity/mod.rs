//! C4 — Identity Cache (§4.4): cached view of user profile + department
//! path + selected tenant, fetched from the directory (C6) on a cache miss
//! and overlaid by a per-user tenant selection on every read.

use serde::{Deserialize, Serialize};
use shared::errors::ApiError;
use shared::redis_client::RedisClient;
use std::time::Duration;

use crate::clients::directory::{flatten_department_path, DirectoryClient, DirectoryUser};

const IDENTITY_PREFIX: &str = "warden:orgs:user:";
const TENANT_PREFIX: &str = "warden:orgs:user:tenant:";

/// `{user_id, name, phone, email, status, positions, department_path,
/// current_tenant_id}` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedIdentity {
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub status: i32,
    pub positions: String,
    pub department_path: String,
    pub current_tenant_id: String,
}

impl CachedIdentity {
    fn from_directory(user_id: &str, user: DirectoryUser) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: user.name,
            phone: user.phone,
            email: user.email,
            status: user.use_status,
            positions: user.position,
            department_path: flatten_department_path(&user.department),
            current_tenant_id: user.tenant_id,
        }
    }
}

pub struct IdentityCache {
    redis: RedisClient,
    directory: DirectoryClient,
    namespace: String,
    profile_ttl: Duration,
    tenant_ttl: Duration,
}

impl IdentityCache {
    pub fn new(
        redis: RedisClient,
        directory: DirectoryClient,
        namespace: impl Into<String>,
        profile_ttl: Duration,
        tenant_ttl: Duration,
    ) -> Self {
        Self { redis, directory, namespace: namespace.into(), profile_ttl, tenant_ttl }
    }

    fn identity_key(&self, user_id: &str) -> String {
        format!("{}{}{}", self.namespace, IDENTITY_PREFIX, user_id)
    }

    fn tenant_key(&self, user_id: &str) -> String {
        format!("{}{}{}", self.namespace, TENANT_PREFIX, user_id)
    }

    /// Cache hit (well-formed) → directory fetch-and-cache on miss or schema
    /// drift → overlay the selected-tenant key if present, refreshing its
    /// TTL (§4.4 write policy).
    pub async fn get(&self, user_id: &str) -> Result<CachedIdentity, ApiError> {
        let cached = self.redis.get_json::<CachedIdentity>(&self.identity_key(user_id)).await;
        let mut identity = match cached {
            Ok(Some(identity)) => identity,
            Ok(None) => self.fetch_and_cache(user_id).await?,
            Err(_) => self.fetch_and_cache(user_id).await?,
        };

        if let Some(tenant_id) = self.redis.get_raw(&self.tenant_key(user_id)).await? {
            identity.current_tenant_id = tenant_id;
            self.redis.expire(&self.tenant_key(user_id), self.tenant_ttl).await?;
        }
        Ok(identity)
    }

    async fn fetch_and_cache(&self, user_id: &str) -> Result<CachedIdentity, ApiError> {
        let user = self.directory.get_user_info(user_id).await?;
        let identity = CachedIdentity::from_directory(user_id, user);
        self.redis
            .set_json(&self.identity_key(user_id), &identity, Some(self.profile_ttl))
            .await?;
        Ok(identity)
    }

    /// Overwrites the selected-tenant key (§4.5 SwitchTenant).
    pub async fn set_tenant(&self, user_id: &str, tenant_id: &str) -> Result<(), ApiError> {
        self.redis
            .set_raw(&self.tenant_key(user_id), tenant_id, Some(self.tenant_ttl))
            .await
    }

    /// Drops the selected-tenant key only (§4.5 Login: fall back to the
    /// directory-supplied tenant on the next Check).
    pub async fn clear_tenant(&self, user_id: &str) -> Result<(), ApiError> {
        self.redis.delete(&self.tenant_key(user_id)).await?;
        Ok(())
    }

    /// Drops both the identity and selected-tenant keys (§4.5
    /// DestroyByUserId, §4.4 invalidation on org mutation).
    pub async fn invalidate(&self, user_id: &str) -> Result<(), ApiError> {
        self.redis.delete(&self.identity_key(user_id)).await?;
        self.redis.delete(&self.tenant_key(user_id)).await?;
        Ok(())
    }
}
