//! In-memory refresh store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_entity::RefreshTokenRecord;

use super::Tables;
use crate::store::{RefreshStore, expires_after};

/// Refresh store over a [`super::MemoryDatabase`].
#[derive(Debug, Clone)]
pub struct MemoryRefreshStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRefreshStore {
    pub(crate) fn new(tables: Arc<Mutex<Tables>>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl RefreshStore for MemoryRefreshStore {
    async fn create(
        &self,
        subject_id: i64,
        access_token: &str,
        refresh_token: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> AppResult<RefreshTokenRecord> {
        let now = Utc::now();
        let access_expires_at = expires_after(now, access_ttl)?;
        let refresh_expires_at = expires_after(now, refresh_ttl)?;

        let mut tables = self.tables.lock().await;
        if tables.tokens.iter().any(|t| t.access_token == access_token) {
            return Err(AppError::conflict("Access token already issued"));
        }

        tables.next_token_id += 1;
        let record = RefreshTokenRecord {
            id: tables.next_token_id,
            subject_id,
            access_token: access_token.to_string(),
            refresh_token: Some(refresh_token.to_string()),
            access_expires_at,
            refresh_expires_at,
            created_at: now,
        };
        tables.tokens.push(record.clone());
        Ok(record)
    }

    async fn lookup_by_refresh(&self, refresh_token: &str) -> AppResult<RefreshTokenRecord> {
        let now = Utc::now();
        let tables = self.tables.lock().await;
        tables
            .tokens
            .iter()
            .find(|t| t.refresh_token.as_deref() == Some(refresh_token) && t.refresh_live_at(now))
            .cloned()
            .ok_or_else(|| AppError::not_found("Refresh token not found"))
    }

    async fn lookup_by_access(&self, access_token: &str) -> AppResult<RefreshTokenRecord> {
        let now = Utc::now();
        let tables = self.tables.lock().await;
        tables
            .tokens
            .iter()
            .find(|t| t.access_token == access_token && t.access_live_at(now))
            .cloned()
            .ok_or_else(|| AppError::not_found("Access token not found"))
    }

    async fn revoke_all_for_subject(&self, subject_id: i64) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        Ok(tables.revoke_subject(subject_id))
    }

    async fn revoke_by_access_token(&self, access_token: &str) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let row = tables
            .tokens
            .iter_mut()
            .find(|t| t.access_token == access_token)
            .ok_or_else(|| AppError::not_found("Access token not found"))?;
        row.refresh_token = None;
        Ok(())
    }

    async fn active_tokens(&self, subject_id: i64) -> AppResult<Vec<RefreshTokenRecord>> {
        let now = Utc::now();
        let tables = self.tables.lock().await;
        Ok(tables
            .tokens
            .iter()
            .filter(|t| t.subject_id == subject_id && t.access_live_at(now))
            .cloned()
            .collect())
    }

    async fn unexpired_access_tokens(&self, subject_id: i64) -> AppResult<Vec<String>> {
        let now = Utc::now();
        let tables = self.tables.lock().await;
        Ok(tables
            .tokens
            .iter()
            .filter(|t| t.subject_id == subject_id && now < t.access_expires_at)
            .map(|t| t.access_token.clone())
            .collect())
    }
}
