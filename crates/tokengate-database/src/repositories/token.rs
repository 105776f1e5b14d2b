//! PostgreSQL refresh store over the `user_tokens` table.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_entity::RefreshTokenRecord;

use super::{db_err, is_unique_violation};
use crate::store::{RefreshStore, expires_after};

const COLUMNS: &str =
    "id, user_id, token, refresh_token, expired_at, refresh_expired_at, created_at";

/// Refresh store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgRefreshStore {
    pool: PgPool,
}

impl PgRefreshStore {
    /// Create a new refresh store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshStore for PgRefreshStore {
    async fn create(
        &self,
        subject_id: i64,
        access_token: &str,
        refresh_token: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> AppResult<RefreshTokenRecord> {
        const OP: &str = "PgRefreshStore::create";

        let now = Utc::now();
        let access_expires_at = expires_after(now, access_ttl)?;
        let refresh_expires_at = expires_after(now, refresh_ttl)?;

        let query = format!(
            "INSERT INTO user_tokens (user_id, token, refresh_token, expired_at, refresh_expired_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        );

        let inserted = sqlx::query_as::<_, RefreshTokenRecord>(&query)
            .bind(subject_id)
            .bind(access_token)
            .bind(refresh_token)
            .bind(access_expires_at)
            .bind(refresh_expires_at)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::conflict("Access token already issued")
                } else {
                    db_err(OP, e)
                }
            })?;

        let count = inserted.len();
        inserted
            .into_iter()
            .next()
            .filter(|_| count == 1)
            .ok_or_else(|| AppError::internal(format!("{OP}: insert affected {count} rows")))
    }

    async fn lookup_by_refresh(&self, refresh_token: &str) -> AppResult<RefreshTokenRecord> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_tokens \
             WHERE refresh_token = $1 AND refresh_expired_at >= $2"
        );

        sqlx::query_as::<_, RefreshTokenRecord>(&query)
            .bind(refresh_token)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("PgRefreshStore::lookup_by_refresh", e))?
            .ok_or_else(|| AppError::not_found("Refresh token not found"))
    }

    async fn lookup_by_access(&self, access_token: &str) -> AppResult<RefreshTokenRecord> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_tokens \
             WHERE token = $1 AND expired_at > $2 AND refresh_token IS NOT NULL"
        );

        sqlx::query_as::<_, RefreshTokenRecord>(&query)
            .bind(access_token)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("PgRefreshStore::lookup_by_access", e))?
            .ok_or_else(|| AppError::not_found("Access token not found"))
    }

    async fn revoke_all_for_subject(&self, subject_id: i64) -> AppResult<u64> {
        // The subject may never have logged in, so zero rows is fine.
        let result = sqlx::query("UPDATE user_tokens SET refresh_token = NULL WHERE user_id = $1")
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("PgRefreshStore::revoke_all_for_subject", e))?;

        Ok(result.rows_affected())
    }

    async fn revoke_by_access_token(&self, access_token: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE user_tokens SET refresh_token = NULL WHERE token = $1")
            .bind(access_token)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("PgRefreshStore::revoke_by_access_token", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Access token not found"));
        }
        Ok(())
    }

    async fn active_tokens(&self, subject_id: i64) -> AppResult<Vec<RefreshTokenRecord>> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_tokens \
             WHERE user_id = $1 AND expired_at > $2 AND refresh_token IS NOT NULL"
        );

        sqlx::query_as::<_, RefreshTokenRecord>(&query)
            .bind(subject_id)
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_err("PgRefreshStore::active_tokens", e))
    }

    async fn unexpired_access_tokens(&self, subject_id: i64) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT token FROM user_tokens WHERE user_id = $1 AND expired_at > $2",
        )
        .bind(subject_id)
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("PgRefreshStore::unexpired_access_tokens", e))
    }
}
