//! Redis cache provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::traits::cache::CacheProvider;

use super::client::RedisClient;

/// Redis-backed cache provider.
#[derive(Debug, Clone)]
pub struct RedisCacheProvider {
    client: RedisClient,
}

impl RedisCacheProvider {
    /// Create a new Redis cache provider.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn map_err(op: &'static str) -> impl Fn(redis::RedisError) -> AppError {
        move |e| AppError::with_source(ErrorKind::Cache, format!("RedisCacheProvider::{op}: {e}"), e)
    }
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        conn.get(&full_key).await.map_err(Self::map_err("get"))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        // PSETEX rejects a zero expiry; such an entry would be dead on arrival.
        let millis = ttl.as_millis() as u64;
        if millis == 0 {
            return Ok(());
        }

        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .pset_ex(&full_key, value, millis)
            .await
            .map_err(Self::map_err("set"))?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let full_keys: Vec<String> = keys.iter().map(|k| self.client.prefixed_key(k)).collect();
        let mut conn = self.client.conn_mut();
        let count: u64 = conn
            .del(&full_keys)
            .await
            .map_err(Self::map_err("delete_many"))?;

        debug!(requested = keys.len(), count, "Deleted cache keys");
        Ok(count)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err("health_check"))?;
        Ok(pong == "PONG")
    }
}
