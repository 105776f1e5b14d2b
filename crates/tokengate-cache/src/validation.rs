//! Cache-aside store for access token validation results.
//!
//! An entry maps a raw access token to either a serialized
//! [`IdentitySnapshot`] or the empty negative marker. No entry outlives
//! the token it describes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use tokengate_core::result::AppResult;
use tokengate_core::traits::cache::CacheProvider;
use tokengate_entity::IdentitySnapshot;

use crate::keys;

/// Payload of a negative entry.
const NEGATIVE_MARKER: &str = "";

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// The token was validated recently and names this identity.
    PositiveHit(IdentitySnapshot),
    /// The token was checked recently and found invalid.
    NegativeHit,
    /// No usable entry: absent, undecodable, or the backend failed.
    Miss,
}

/// Validation cache over any [`CacheProvider`].
#[derive(Debug, Clone)]
pub struct ValidationCache {
    provider: Arc<dyn CacheProvider>,
    max_ttl: Duration,
}

impl ValidationCache {
    /// Create a validation cache whose entries never live longer than `max_ttl`.
    pub fn new(provider: Arc<dyn CacheProvider>, max_ttl: Duration) -> Self {
        Self { provider, max_ttl }
    }

    /// Look up the entry for `token`.
    ///
    /// Backend failures are logged and reported as [`CacheLookup::Miss`].
    pub async fn lookup(&self, token: &str) -> CacheLookup {
        let raw = match self.provider.get(&keys::access_token(token)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheLookup::Miss,
            Err(e) => {
                warn!(error = %e, "Validation cache read failed");
                return CacheLookup::Miss;
            }
        };

        if raw == NEGATIVE_MARKER {
            return CacheLookup::NegativeHit;
        }

        match serde_json::from_str::<IdentitySnapshot>(&raw) {
            Ok(snapshot) if snapshot.is_positive() => CacheLookup::PositiveHit(snapshot),
            Ok(_) => CacheLookup::NegativeHit,
            Err(e) => {
                debug!(error = %e, "Undecodable validation cache entry");
                CacheLookup::Miss
            }
        }
    }

    /// Record `token` as valid for `snapshot` until `expires_at` at the latest.
    pub async fn store_positive(
        &self,
        token: &str,
        snapshot: &IdentitySnapshot,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let Some(ttl) = self.entry_ttl(expires_at, Utc::now()) else {
            return Ok(());
        };
        let payload = serde_json::to_string(snapshot)?;
        self.provider
            .set(&keys::access_token(token), &payload, ttl)
            .await
    }

    /// Record `token` as invalid until `expires_at` at the latest.
    pub async fn store_negative(&self, token: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        let Some(ttl) = self.entry_ttl(expires_at, Utc::now()) else {
            return Ok(());
        };
        self.provider
            .set(&keys::access_token(token), NEGATIVE_MARKER, ttl)
            .await
    }

    /// Evict the entries of `tokens`. Returns how many existed.
    pub async fn purge(&self, tokens: &[String]) -> AppResult<u64> {
        let keys = keys::access_tokens(tokens.iter().map(String::as_str));
        self.provider.delete_many(&keys).await
    }

    /// `min(max_ttl, expires_at - now)`, or `None` if the token is already dead.
    fn entry_ttl(&self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = (expires_at - now).to_std().ok()?;
        let ttl = remaining.min(self.max_ttl);
        (!ttl.is_zero()).then_some(ttl)
    }
}
