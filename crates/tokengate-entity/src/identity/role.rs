//! Role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use tokengate_core::AppError;

/// Roles an identity can hold.
///
/// The numeric ids are persisted in `users.role_id` and seeded into the
/// `roles` table; the role id is the only authorization signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account.
    User,
    /// Account allowed to publish content.
    Creator,
    /// Content moderator. Gets no extra trust from the gate.
    Moderator,
    /// Administrator.
    Admin,
}

impl Role {
    /// Every role, in id order.
    pub const ALL: [Role; 4] = [Self::User, Self::Creator, Self::Moderator, Self::Admin];

    /// Return the persisted numeric id.
    pub fn id(&self) -> i64 {
        match self {
            Self::User => 1,
            Self::Creator => 2,
            Self::Moderator => 99,
            Self::Admin => 100,
        }
    }

    /// Return the role name as a lowercase string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Creator => "creator",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<i64> for Role {
    type Error = AppError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|role| role.id() == id)
            .ok_or_else(|| AppError::validation(format!("Unknown role id: {id}")))
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "creator" => Ok(Self::Creator),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: user, creator, moderator, admin"
            ))),
        }
    }
}
