//! Refresh token record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One issued (access token, refresh token) pair.
///
/// Revocation nulls `refresh_token`; rows are never deleted here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshTokenRecord {
    /// Row id.
    pub id: i64,
    /// Owning subject.
    #[sqlx(rename = "user_id")]
    pub subject_id: i64,
    /// Raw access token.
    #[sqlx(rename = "token")]
    pub access_token: String,
    /// Raw refresh token, `None` once revoked.
    pub refresh_token: Option<String>,
    /// Access token expiry.
    #[sqlx(rename = "expired_at")]
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    #[sqlx(rename = "refresh_expired_at")]
    pub refresh_expires_at: DateTime<Utc>,
    /// When the pair was issued.
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Whether the refresh token has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.refresh_token.is_none()
    }

    /// Live for access: not revoked and `now < access_expires_at`.
    pub fn access_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && now < self.access_expires_at
    }

    /// Live for refresh: not revoked and `now <= refresh_expires_at`.
    pub fn refresh_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && now <= self.refresh_expires_at
    }
}
