//! # Redis Client for the Token Store and Identity Cache
//!
//! Thin async wrapper around a Redis `ConnectionManager`, shared by the
//! Token Store (C2) and the Identity Cache (C4). Both need more than
//! simple get/set: the store commits multi-key grants through a single
//! pipelined transaction, and maintains the `jwt:users:{userId}` hash
//! used by `clean_by_user`/`remove_token` (C2/C3).
//!
//! ## Connection Management
//!
//! We use a `ConnectionManager`, which reconnects automatically on failure.
//! It's safe to clone and share across tasks — each clone multiplexes over
//! the same underlying connection.
//!
//! ## Key Naming Convention
//!
//! Keys are namespaced per [`crate::config::RedisConfig::namespace`] and then
//! follow the layout described in the Token Store and Identity Cache specs:
//!
//! | Pattern | Purpose |
//! |---------|---------|
//! | `jwt:{accessToken}` / `jwt:{refreshToken}` | Credential → `basicId` |
//! | `jwt:{basicId}` | `basicId` → grant envelope (JSON) |
//! | `jwt:users:{userId}` | Hash of `basicId -> accessToken` for a user |
//! | `warden:orgs:user:{userId}` | Cached identity profile |
//! | `warden:orgs:user:tenant:{userId}` | Cached tenant override |
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use shared::redis_client::RedisClient;
//! use shared::config::RedisConfig;
//!
//! let redis = RedisClient::new(&config.redis).await?;
//! redis.set_ex("warden:users:42", &profile, Duration::from_secs(1800)).await?;
//! let profile: Option<Profile> = redis.get_json("warden:users:42").await?;
//! ```
//!
//! ## Related Documentation
//!
//! - [`crate::config::RedisConfig`] - Connection configuration

use crate::config::RedisConfig;
use crate::errors::ApiError;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Pipeline};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

/// Async Redis client with automatic reconnection.
///
/// `Clone + Send + Sync`; cloning only clones the underlying manager handle.
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
}

impl RedisClient {
    /// Creates a new Redis client and establishes the initial connection.
    pub async fn new(config: &RedisConfig) -> Result<Self, ApiError> {
        let url = config.connection_url();
        info!(addr = %config.addrs.first().cloned().unwrap_or_default(), "connecting to redis");

        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("redis connection established");
        Ok(Self { conn })
    }

    /// Returns a cloned connection manager for callers (the Token Store)
    /// that need to build and execute their own multi-command pipelines.
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Executes a pipeline of write commands. The pipeline is expected to be
    /// built with `.atomic()` by the caller when transactional semantics are
    /// required; this method does not inspect individual command results.
    pub async fn execute_pipeline(&self, pipe: &Pipeline) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    // =========================================================================
    // String values
    // =========================================================================

    /// Stores a raw string value with an optional TTL.
    pub async fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(d) => conn.set_ex::<_, _, ()>(key, value, d.as_secs()).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    /// Retrieves a raw string value.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, ApiError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    /// Serializes `value` to JSON and stores it with an optional TTL.
    pub async fn set_json<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), ApiError> {
        let serialized = serde_json::to_string(value)?;
        self.set_raw(key, &serialized, ttl).await
    }

    /// Retrieves and deserializes a JSON value.
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ApiError> {
        match self.get_raw(key).await? {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Deletes a key. Returns `true` if a key was removed.
    pub async fn delete(&self, key: &str) -> Result<bool, ApiError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    /// Checks whether a key exists.
    pub async fn exists(&self, key: &str) -> Result<bool, ApiError> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    /// Sets a TTL on an existing key. Returns `true` if the key existed.
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, ApiError> {
        let mut conn = self.conn.clone();
        Ok(conn.expire(key, ttl.as_secs() as i64).await?)
    }

    /// Health check, used by the `/health` endpoint.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    // =========================================================================
    // Hash operations — backs the per-user `jwt:users:{userId}` index
    // =========================================================================

    /// `HSET key field value`.
    pub async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }

    /// `HGET key field`.
    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, ApiError> {
        let mut conn = self.conn.clone();
        Ok(conn.hget(key, field).await?)
    }

    /// `HDEL key field`.
    pub async fn hdel(&self, key: &str, field: &str) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        conn.hdel::<_, _, ()>(key, field).await?;
        Ok(())
    }

    /// `HKEYS key`.
    pub async fn hkeys(&self, key: &str) -> Result<Vec<String>, ApiError> {
        let mut conn = self.conn.clone();
        Ok(conn.hkeys(key).await?)
    }

    /// `HGETALL key`.
    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, ApiError> {
        let mut conn = self.conn.clone();
        Ok(conn.hgetall(key).await?)
    }
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient").finish_non_exhaustive()
    }
}
