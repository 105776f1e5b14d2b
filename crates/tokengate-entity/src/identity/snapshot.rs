//! Cached identity projection and the validated identity handed to callers.

use serde::{Deserialize, Serialize};

use tokengate_core::AppError;

use super::role::Role;

/// Identity fields cached against a raw access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    /// Subject id. Zero never identifies a real subject.
    #[serde(rename = "id", default)]
    pub subject_id: i64,
    /// Role id at the time the snapshot was taken.
    #[serde(default)]
    pub role_id: i64,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
}

impl IdentitySnapshot {
    /// Whether the snapshot names a real subject.
    pub fn is_positive(&self) -> bool {
        self.subject_id != 0
    }
}

/// The result of a successful token validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    /// Subject id.
    pub subject_id: i64,
    /// Role carried by the session.
    pub role: Role,
    /// Phone number.
    pub phone: String,
}

impl AuthenticatedIdentity {
    /// Whether the identity holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl TryFrom<IdentitySnapshot> for AuthenticatedIdentity {
    type Error = AppError;

    fn try_from(snapshot: IdentitySnapshot) -> Result<Self, Self::Error> {
        Ok(Self {
            subject_id: snapshot.subject_id,
            role: Role::try_from(snapshot.role_id)?,
            phone: snapshot.phone,
        })
    }
}
