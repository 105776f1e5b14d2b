//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tokengate_core::types::pagination::{PageRequest, PageResponse};
use tokengate_entity::{AuthenticatedIdentity, Identity, Role};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always `true`; failures use [`crate::error::ApiErrorResponse`].
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Public view of an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityResponse {
    /// Subject id.
    pub id: i64,
    /// Phone number.
    pub phone: String,
    /// Role name.
    pub role: Role,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last successful token validation.
    pub last_visited_at: Option<DateTime<Utc>>,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            phone: identity.phone,
            role: identity.role,
            created_at: identity.created_at,
            last_visited_at: identity.last_visited_at,
        }
    }
}

/// The caller as seen by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    /// Subject id.
    pub id: i64,
    /// Role carried by the token's cache entry or record.
    pub role: Role,
    /// Phone number.
    pub phone: String,
}

impl From<AuthenticatedIdentity> for WhoAmIResponse {
    fn from(identity: AuthenticatedIdentity) -> Self {
        Self {
            id: identity.subject_id,
            role: identity.role,
            phone: identity.phone,
        }
    }
}

/// Paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T: Serialize> {
    /// Items in this page.
    pub items: Vec<T>,
    /// Total item count.
    pub total: i64,
    /// Requested page size.
    pub limit: i64,
    /// Requested offset.
    pub offset: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Wraps a store page together with the request that produced it.
    pub fn from_page(page: PageResponse<T>, request: PageRequest) -> Self {
        Self {
            items: page.items,
            total: page.total,
            limit: request.limit,
            offset: request.offset,
        }
    }
}

/// Result of a session reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    /// Subject whose sessions were revoked.
    pub user_id: i64,
}

/// Result of a role change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    /// Target subject id.
    pub user_id: i64,
    /// Newly assigned role.
    pub role: Role,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Liveness and dependency health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Whether the durable store answered a health check.
    pub database: bool,
    /// Whether the cache answered a health check.
    pub cache: bool,
}
