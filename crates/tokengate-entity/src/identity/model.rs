//! Identity entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::role::Role;
use super::snapshot::IdentitySnapshot;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Identity {
    /// Unique, immutable subject id.
    pub id: i64,
    /// Phone number, unique among non-deleted identities.
    pub phone: String,
    /// Salted, peppered password digest.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Salt used for `password_hash`.
    #[serde(skip_serializing)]
    pub password_salt: Vec<u8>,
    /// Assigned role.
    #[sqlx(rename = "role_id", try_from = "i64")]
    pub role: Role,
    /// When the identity was created.
    pub created_at: DateTime<Utc>,
    /// When the identity was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion marker.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Last successful token validation.
    pub last_visited_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Whether the identity has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The projection stored in the validation cache.
    pub fn snapshot(&self) -> IdentitySnapshot {
        IdentitySnapshot {
            subject_id: self.id,
            role_id: self.role.id(),
            phone: self.phone.clone(),
        }
    }
}

/// Data required to create a new identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    /// Phone number.
    pub phone: String,
    /// Pre-computed password digest.
    pub password_hash: String,
    /// Salt used for the digest.
    pub password_salt: Vec<u8>,
    /// Initial role.
    pub role: Role,
}
