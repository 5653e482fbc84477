//! Grant envelope: the authoritative record of one issued access/refresh pair (§3).
//!
//! An envelope is created on Login or Refresh, mutated only by Refresh (which
//! replaces its access/refresh fields while keeping `basic_id`), and destroyed
//! by Logout, DestroyByUserId, refresh-rotation, or TTL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One issuance of an access/refresh pair for one user.
///
/// `basic_id` is the join key correlating the three store entries of §3 for
/// this grant; it is minted fresh on every Create and never reused across
/// grants (I2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantEnvelope {
    pub basic_id: String,
    pub user_id: String,

    pub access_token: String,
    pub access_created_at: DateTime<Utc>,
    pub access_ttl_secs: i64,

    /// Empty string when refresh issuance is disabled (`generate_refresh = false`).
    #[serde(default)]
    pub refresh_token: String,
    pub refresh_created_at: DateTime<Utc>,
    #[serde(default)]
    pub refresh_ttl_secs: i64,

    /// Copied verbatim into the signed access token's `sub` claim at issuance.
    #[serde(default)]
    pub other_info: HashMap<String, String>,
}

impl GrantEnvelope {
    pub fn has_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs.max(0) as u64)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs.max(0) as u64)
    }

    pub fn access_expires_at(&self) -> DateTime<Utc> {
        self.access_created_at + chrono::Duration::seconds(self.access_ttl_secs)
    }

    pub fn refresh_expires_at(&self) -> DateTime<Utc> {
        self.refresh_created_at + chrono::Duration::seconds(self.refresh_ttl_secs)
    }

    /// I3: true once the access TTL has been clamped to at most the refresh TTL.
    pub fn is_access_ttl_clamped(&self) -> bool {
        !self.has_refresh() || self.access_ttl_secs <= self.refresh_ttl_secs
    }

    pub fn is_access_expired(&self, now: DateTime<Utc>) -> bool {
        self.access_expires_at() < now
    }

    /// A grant without a refresh token never expires on the refresh side.
    pub fn is_refresh_expired(&self, now: DateTime<Utc>) -> bool {
        self.has_refresh() && self.refresh_ttl_secs != 0 && self.refresh_expires_at() < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(access_ttl: i64, refresh_ttl: i64) -> GrantEnvelope {
        let now = Utc::now();
        GrantEnvelope {
            basic_id: "b1".into(),
            user_id: "u1".into(),
            access_token: "a1".into(),
            access_created_at: now,
            access_ttl_secs: access_ttl,
            refresh_token: "r1".into(),
            refresh_created_at: now,
            refresh_ttl_secs: refresh_ttl,
            other_info: HashMap::new(),
        }
    }

    #[test]
    fn access_expiry_respects_ttl() {
        let env = envelope(3600, 7200);
        assert!(!env.is_access_expired(env.access_created_at + chrono::Duration::seconds(1000)));
        assert!(env.is_access_expired(env.access_created_at + chrono::Duration::seconds(3601)));
    }

    #[test]
    fn envelope_without_refresh_never_expires_on_refresh_side() {
        let mut env = envelope(3600, 0);
        env.refresh_token.clear();
        assert!(!env.is_refresh_expired(Utc::now() + chrono::Duration::days(3650)));
    }
}
