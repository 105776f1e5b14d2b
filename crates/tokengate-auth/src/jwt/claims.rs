//! JWT claims carried by every access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id.
    pub uid: i64,
    /// Role id at issuance.
    pub role_id: i64,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Random token id; keeps two tokens minted in the same second distinct.
    pub jti: String,
}

impl Claims {
    /// Expiry as a timestamp.
    ///
    /// An out-of-range `exp` maps to the earliest representable instant,
    /// so the token reads as long expired.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether the token is expired at `now` (seconds). The boundary is exclusive.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
