//! # Configuration
//!
//! Loads the authority service's configuration once at startup into an explicit,
//! immutable [`AppConfig`] value. The base layer is a YAML file (path given by the
//! `--config` CLI flag, default `./configs/config.yml`); environment variables
//! prefixed `WARDEN__` with `__` as a nesting separator override individual fields
//! (`WARDEN__REDIS__PASSWORD=...`), matching the layering pattern this codebase
//! already uses for env-driven overrides, adapted to start from a file source.
//!
//! ## Schema
//!
//! | Field | YAML key | Purpose |
//! |-------|----------|---------|
//! | `port` | `port` | HTTP bind port |
//! | `model` | `model` | `debug` or `release`; selects the tracing output mode |
//! | `internal_net` | `internalNet` | HTTP client tuning for outbound collaborator calls |
//! | `redis` | `redis` | K/V store connection |
//! | `org_api` | `orgAPI` | Directory service endpoints and cache TTL |
//! | `jwt` | `jwtConfig` | Signing algorithm/key and token lifetimes |
//! | `log` | `log` | Logging level/format |

use crate::errors::ApiError;
use serde::Deserialize;

/// Default path for the YAML config file, used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./configs/config.yml";

/// Root configuration value, constructed once at startup and passed by
/// reference into every component — no process-global config cell.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub model: RunMode,
    #[serde(default, rename = "internalNet")]
    pub internal_net: InternalNetConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(rename = "orgAPI")]
    pub org_api: OrgApiConfig,
    #[serde(rename = "jwtConfig")]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Operating mode, mirrored from the YAML `model` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Debug,
    Release,
}

/// HTTP client tuning for the Directory and Password-Verifier clients (C6/C7).
#[derive(Debug, Clone, Deserialize)]
pub struct InternalNetConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_idle_conns")]
    pub max_idle_conns: usize,
}

impl Default for InternalNetConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_idle_conns: default_max_idle_conns(),
        }
    }
}

/// Redis connection configuration for the Token Store and Identity Cache.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_addrs")]
    pub addrs: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// Namespace prefix prepended to every store key (`jwt:`/`warden:orgs:...` are
    /// relative to this). Empty by default, matching the original key layout.
    #[serde(default)]
    pub namespace: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addrs: default_redis_addrs(),
            username: None,
            password: None,
            pool_size: default_pool_size(),
            namespace: String::new(),
        }
    }
}

impl RedisConfig {
    /// Builds a `redis://` connection URL from the first configured address.
    pub fn connection_url(&self) -> String {
        let addr = self
            .addrs
            .first()
            .cloned()
            .unwrap_or_else(|| "127.0.0.1:6379".to_string());
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => format!("redis://{u}:{p}@{addr}"),
            (None, Some(p)) => format!("redis://:{p}@{addr}"),
            _ => format!("redis://{addr}"),
        }
    }
}

/// Directory-service client configuration (§6 `orgAPI`).
#[derive(Debug, Clone, Deserialize)]
pub struct OrgApiConfig {
    pub host: String,
    /// Identity-cache TTL, in minutes.
    #[serde(default = "default_org_exp_minutes")]
    pub exp: i64,
    #[serde(rename = "loginURI")]
    pub login_uri: String,
    #[serde(default, rename = "updateUserStatusURI")]
    pub update_user_status_uri: String,
    #[serde(default, rename = "updateUsersStatusURI")]
    pub update_users_status_uri: String,
    #[serde(default, rename = "adminResetPasswordURI")]
    pub admin_reset_password_uri: String,
    #[serde(default, rename = "userResetPasswordURI")]
    pub user_reset_password_uri: String,
    #[serde(default, rename = "userForgetResetPasswordURI")]
    pub user_forget_reset_password_uri: String,
}

/// Signing algorithm family for the Signed Access Generator (C1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigningAlgorithm {
    HS256,
    HS384,
    HS512,
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
    ES256,
    ES384,
}

/// JWT signer + token-lifetime configuration (§6 `jwtConfig`).
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default = "default_access_exp_hours")]
    pub access_token_exp: i64,
    #[serde(default = "default_refresh_exp_hours")]
    pub refresh_token_exp: i64,
    #[serde(default = "default_algorithm")]
    pub algorithm: SigningAlgorithm,
    /// HMAC secret, or PEM-encoded private key for RSA/ECDSA.
    pub jwt_key: String,
    /// PEM-encoded public key, required for RSA/ECDSA verification.
    #[serde(default)]
    pub jwt_public_key: Option<String>,
    /// Optional `kid` header value.
    #[serde(default)]
    pub key_id: Option<String>,
    #[serde(default)]
    pub server_host: String,
    #[serde(default = "default_true")]
    pub generate_refresh: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_port() -> String {
    "8080".to_string()
}
fn default_timeout_seconds() -> u64 {
    10
}
fn default_max_idle_conns() -> usize {
    32
}
fn default_redis_addrs() -> Vec<String> {
    vec!["127.0.0.1:6379".to_string()]
}
fn default_pool_size() -> u32 {
    16
}
fn default_org_exp_minutes() -> i64 {
    30
}
fn default_access_exp_hours() -> i64 {
    2
}
fn default_refresh_exp_hours() -> i64 {
    24
}
fn default_algorithm() -> SigningAlgorithm {
    SigningAlgorithm::HS256
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Loads configuration from the YAML file at `path`, overlaid by `WARDEN__*`
    /// environment variables. This is the sole place the process touches the
    /// filesystem/environment for configuration; everything downstream receives
    /// an already-built `AppConfig` by reference.
    pub fn load(path: &str) -> Result<Self, ApiError> {
        // Best-effort: a local `.env` is a dev convenience for setting
        // `WARDEN__*` overrides, not a deployment requirement.
        let _ = dotenvy::dotenv();

        let raw = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("WARDEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ApiError::internal(format!("failed to build configuration: {e}")))?;

        raw.try_deserialize()
            .map_err(|e| ApiError::internal(format!("failed to parse configuration: {e}")))
    }

    pub fn is_debug(&self) -> bool {
        self.model == RunMode::Debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_mode_defaults_to_debug() {
        assert_eq!(RunMode::default(), RunMode::Debug);
    }

    #[test]
    fn redis_connection_url_without_credentials() {
        let cfg = RedisConfig { addrs: vec!["localhost:6379".into()], ..RedisConfig::default() };
        assert_eq!(cfg.connection_url(), "redis://localhost:6379");
    }

    #[test]
    fn redis_connection_url_with_password() {
        let cfg = RedisConfig {
            addrs: vec!["localhost:6379".into()],
            password: Some("secret".into()),
            ..RedisConfig::default()
        };
        assert_eq!(cfg.connection_url(), "redis://:secret@localhost:6379");
    }
}
