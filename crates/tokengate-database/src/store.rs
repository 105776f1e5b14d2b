//! Store contracts consumed by the session manager and the account service.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::types::pagination::{PageRequest, PageResponse};
use tokengate_entity::{Identity, NewIdentity, RefreshTokenRecord, Role};

/// Durable record of issued (access token, refresh token) pairs.
///
/// Revocation nulls the refresh token and keeps the row.
#[async_trait]
pub trait RefreshStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new pair with expiries `now + access_ttl` and `now + refresh_ttl`.
    ///
    /// Fails unless exactly one row was inserted. A duplicate access
    /// token is a `Conflict`.
    async fn create(
        &self,
        subject_id: i64,
        access_token: &str,
        refresh_token: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> AppResult<RefreshTokenRecord>;

    /// Find the row holding `refresh_token` if it is non-null and
    /// `refresh_expires_at >= now`; `NotFound` otherwise.
    async fn lookup_by_refresh(&self, refresh_token: &str) -> AppResult<RefreshTokenRecord>;

    /// Find the row for `access_token` if it is not revoked and
    /// `access_expires_at > now`; `NotFound` otherwise.
    async fn lookup_by_access(&self, access_token: &str) -> AppResult<RefreshTokenRecord>;

    /// Null the refresh token of every row of the subject. Idempotent.
    ///
    /// Returns the number of rows touched.
    async fn revoke_all_for_subject(&self, subject_id: i64) -> AppResult<u64>;

    /// Null the refresh token of the row issued for `access_token`.
    ///
    /// Revoking an already revoked row succeeds; an unknown token is `NotFound`.
    async fn revoke_by_access_token(&self, access_token: &str) -> AppResult<()>;

    /// Rows with a non-null refresh token and `access_expires_at > now`.
    async fn active_tokens(&self, subject_id: i64) -> AppResult<Vec<RefreshTokenRecord>>;

    /// Access tokens of every row with `access_expires_at > now`, revoked or not.
    ///
    /// Used to purge cache entries after a transaction already revoked the rows.
    async fn unexpired_access_tokens(&self, subject_id: i64) -> AppResult<Vec<String>>;
}

/// Persistence for identities.
///
/// Every lookup ignores soft-deleted identities unless stated otherwise.
/// Mutations that must revoke sessions null the subject's refresh tokens
/// inside the same transaction.
#[async_trait]
pub trait IdentityRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Whether an active identity holds `phone`.
    async fn phone_exists(&self, phone: &str) -> AppResult<bool>;

    /// Find an active identity by phone.
    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<Identity>>;

    /// Find an active identity by id.
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Identity>>;

    /// Insert a new identity. A phone held by an active identity is a `Conflict`.
    async fn create(&self, identity: NewIdentity) -> AppResult<Identity>;

    /// Replace digest and salt, then revoke all refresh tokens.
    async fn update_password(&self, id: i64, password_hash: &str, salt: &[u8]) -> AppResult<()>;

    /// Change the phone, then revoke all refresh tokens.
    async fn update_phone(&self, id: i64, phone: &str) -> AppResult<()>;

    /// Change the role, then revoke all refresh tokens.
    async fn change_role(&self, id: i64, role: Role) -> AppResult<()>;

    /// Set the deletion marker, then revoke all refresh tokens.
    async fn soft_delete(&self, id: i64) -> AppResult<()>;

    /// Clear the deletion marker of a deleted identity.
    ///
    /// `Conflict` if another active identity took the phone meanwhile.
    async fn dig_up(&self, id: i64) -> AppResult<Identity>;

    /// Record a successful validation.
    async fn touch_last_visit(&self, id: i64) -> AppResult<()>;

    /// Active identities ordered by id, plus their total count.
    async fn list(&self, page: PageRequest) -> AppResult<PageResponse<Identity>>;

    /// Round-trip to the backing store.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Absolute expiry for a TTL starting at `now`.
pub fn expires_after(now: DateTime<Utc>, ttl: Duration) -> AppResult<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::internal(format!("TTL out of range: {ttl:?}")))
}
