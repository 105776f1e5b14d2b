//! In-memory store implementations.
//!
//! Identities and token rows live behind one lock so that a mutation that
//! also revokes tokens is applied atomically, like the PostgreSQL
//! transaction it stands in for.

pub mod identity;
pub mod token;

use std::sync::Arc;

use tokio::sync::Mutex;

use tokengate_entity::{Identity, RefreshTokenRecord};

pub use identity::MemoryIdentityRepository;
pub use token::MemoryRefreshStore;

/// Tables shared by the in-memory repositories.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) users: Vec<Identity>,
    pub(crate) tokens: Vec<RefreshTokenRecord>,
    pub(crate) next_user_id: i64,
    pub(crate) next_token_id: i64,
}

impl Tables {
    /// Null the refresh token of every row of `subject_id`.
    pub(crate) fn revoke_subject(&mut self, subject_id: i64) -> u64 {
        let mut touched = 0;
        for row in self.tokens.iter_mut().filter(|t| t.subject_id == subject_id) {
            row.refresh_token = None;
            touched += 1;
        }
        touched
    }
}

/// Handle to one in-memory database.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity repository over this database.
    pub fn identities(&self) -> MemoryIdentityRepository {
        MemoryIdentityRepository::new(Arc::clone(&self.tables))
    }

    /// Refresh store over this database.
    pub fn refresh_store(&self) -> MemoryRefreshStore {
        MemoryRefreshStore::new(Arc::clone(&self.tables))
    }
}
