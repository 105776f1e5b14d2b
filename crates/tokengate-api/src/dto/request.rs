//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegistrationRequest {
    /// Phone number used as the login.
    #[validate(length(min = 1, max = 32, message = "Phone is required"))]
    pub phone: String,
    /// Plaintext password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Phone number.
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    /// Refresh token from a previous login or refresh.
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Account update request. At least one field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateRequest {
    /// New password.
    #[validate(length(min = 1))]
    pub password: Option<String>,
    /// New phone number.
    #[validate(length(min = 1, max = 32))]
    pub phone: Option<String>,
}

/// Session reset request; admins may name a target.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResetTokenRequest {
    /// Subject whose sessions are revoked.
    #[validate(range(min = 1))]
    pub user_id: Option<i64>,
}

/// Request naming a single subject.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserIdRequest {
    /// Target subject id.
    #[validate(range(min = 1))]
    pub user_id: i64,
}

/// Role change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangeRoleRequest {
    /// Target subject id.
    #[validate(range(min = 1))]
    pub user_id: i64,
    /// Role name, e.g. `"moderator"`.
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}
