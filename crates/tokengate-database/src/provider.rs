//! Store selection based on configuration.

use std::sync::Arc;

use tracing::info;

use tokengate_core::config::DatabaseConfig;
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;

use crate::store::{IdentityRepository, RefreshStore};

/// The durable stores shared by the session manager and the account service.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Identity persistence.
    pub identities: Arc<dyn IdentityRepository>,
    /// Issued token pairs.
    pub refresh: Arc<dyn RefreshStore>,
}

impl Stores {
    /// Build the stores for the configured provider.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "postgres" => {
                let pool = crate::pool::connect_pool(config).await?;
                Ok(Self {
                    identities: Arc::new(crate::repositories::PgIdentityRepository::new(pool.clone())),
                    refresh: Arc::new(crate::repositories::PgRefreshStore::new(pool)),
                })
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Using in-memory store; data is lost on shutdown");
                Ok(Self::in_memory())
            }
            other => Err(AppError::configuration(format!(
                "Unknown database provider: '{other}'. Supported: postgres, memory"
            ))),
        }
    }

    /// Whether the durable store answers.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.identities.health_check().await
    }

    /// Fresh in-memory stores sharing one database.
    #[cfg(feature = "memory")]
    pub fn in_memory() -> Self {
        let db = crate::memory::MemoryDatabase::new();
        Self {
            identities: Arc::new(db.identities()),
            refresh: Arc::new(db.refresh_store()),
        }
    }
}
