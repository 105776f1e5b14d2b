//! Shared fixture for service tests: in-memory stores, moka cache, fast hasher.

use std::sync::Arc;
use std::time::Duration;

use tokengate_auth::{Argon2CredentialHasher, AuthorizationGate, SessionManager, TokenPair, TokenSigner};
use tokengate_cache::ValidationCache;
use tokengate_cache::memory::MemoryCacheProvider;
use tokengate_core::config::MemoryCacheConfig;
use tokengate_database::Stores;
use tokengate_entity::{AuthenticatedIdentity, Identity, Role};

use crate::{AccountService, AdminAccountService};

pub(crate) const PASSWORD: &str = "secret1";

pub(crate) struct Fixture {
    pub stores: Stores,
    pub sessions: Arc<SessionManager>,
    pub accounts: AccountService,
    pub admin: AdminAccountService,
}

impl Fixture {
    pub fn new() -> Self {
        let stores = Stores::in_memory();
        let hasher = Arc::new(Argon2CredentialHasher::fast(b"pepper", 16));
        let access_ttl = Duration::from_secs(900);
        let provider = Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
        let sessions = Arc::new(SessionManager::new(
            Arc::new(TokenSigner::with_ttl(b"signing-secret", access_ttl)),
            hasher.clone(),
            Arc::clone(&stores.identities),
            Arc::clone(&stores.refresh),
            ValidationCache::new(provider, access_ttl),
            Duration::from_secs(3600),
        ));
        let gate = Arc::new(AuthorizationGate::new());

        let accounts = AccountService::new(
            Arc::clone(&stores.identities),
            hasher,
            16,
            Arc::clone(&sessions),
            Arc::clone(&gate),
        );
        let admin = AdminAccountService::new(Arc::clone(&stores.identities), Arc::clone(&sessions), gate);

        Self {
            stores,
            sessions,
            accounts,
            admin,
        }
    }

    /// Register `phone` and promote it to `role` directly in the store.
    pub async fn account(&self, phone: &str, role: Role) -> AuthenticatedIdentity {
        let identity: Identity = self.accounts.register(phone, PASSWORD).await.unwrap();
        if role != Role::User {
            self.stores.identities.change_role(identity.id, role).await.unwrap();
        }
        AuthenticatedIdentity {
            subject_id: identity.id,
            role,
            phone: identity.phone,
        }
    }

    pub async fn login(&self, phone: &str) -> TokenPair {
        self.sessions.login(phone, PASSWORD).await.unwrap()
    }
}
