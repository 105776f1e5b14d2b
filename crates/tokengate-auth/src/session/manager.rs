//! Session manager: the consistency contract between signed tokens, the
//! validation cache, and the refresh store.
//!
//! The refresh store is the source of truth for revocation. The cache only
//! short-circuits lookups, and every entry is bounded by its token's expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use tokengate_cache::{CacheLookup, ValidationCache};
use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_database::{IdentityRepository, RefreshStore};
use tokengate_entity::{AuthenticatedIdentity, Identity, IdentitySnapshot};

use crate::jwt::{Claims, TokenSigner};
use crate::password::{CredentialHasher, RefreshTokenGenerator};

/// Message for every token rejection. Callers never learn why.
const INVALID_TOKEN: &str = "Invalid or expired token";

/// Tokens handed to a client after login or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived signed access token.
    pub access_token: String,
    /// Opaque refresh token.
    pub refresh_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Issues, validates, rotates, and revokes sessions.
#[derive(Clone)]
pub struct SessionManager {
    signer: Arc<TokenSigner>,
    hasher: Arc<dyn CredentialHasher>,
    refresh_tokens: RefreshTokenGenerator,
    identities: Arc<dyn IdentityRepository>,
    store: Arc<dyn RefreshStore>,
    cache: ValidationCache,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("signer", &self.signer)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a session manager over the given collaborators.
    pub fn new(
        signer: Arc<TokenSigner>,
        hasher: Arc<dyn CredentialHasher>,
        identities: Arc<dyn IdentityRepository>,
        store: Arc<dyn RefreshStore>,
        cache: ValidationCache,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            signer,
            hasher,
            refresh_tokens: RefreshTokenGenerator::new(),
            identities,
            store,
            cache,
            refresh_ttl,
        }
    }

    /// Validates a raw bearer token.
    ///
    /// `Ok` carries the identity; `InvalidToken` means the token must not be
    /// trusted; any other error is an infrastructure failure.
    ///
    /// 1. Empty token: invalid, no I/O.
    /// 2. Signature and expiry are checked locally; a failure is final.
    /// 3. A positive cache entry for the same subject is trusted.
    /// 4. A negative cache entry is invalid without a store lookup.
    /// 5. Otherwise the refresh store decides and the result is cached.
    pub async fn validate(&self, raw_token: &str) -> AppResult<AuthenticatedIdentity> {
        if raw_token.is_empty() {
            return Err(AppError::invalid_token(INVALID_TOKEN));
        }

        let claims = self.signer.verify(raw_token).map_err(|e| {
            debug!(error = %e, "Token rejected by signer");
            AppError::from(e)
        })?;

        match self.cache.lookup(raw_token).await {
            CacheLookup::PositiveHit(snapshot) => {
                if let Some(identity) = Self::trusted_snapshot(&claims, snapshot) {
                    debug!(subject_id = identity.subject_id, "Validation cache hit");
                    self.touch_last_visit(identity.subject_id);
                    return Ok(identity);
                }
                debug!(subject_id = claims.uid, "Unusable validation cache entry");
            }
            CacheLookup::NegativeHit => {
                debug!(subject_id = claims.uid, "Negative validation cache hit");
                return Err(AppError::invalid_token(INVALID_TOKEN));
            }
            CacheLookup::Miss => {
                debug!(subject_id = claims.uid, "Validation cache miss");
            }
        }

        let record = match self.store.lookup_by_access(raw_token).await {
            Ok(record) if record.subject_id == claims.uid => record,
            Ok(record) => {
                warn!(
                    subject_id = claims.uid,
                    record_subject_id = record.subject_id,
                    "Token row belongs to another subject"
                );
                self.remember_invalid(raw_token, &claims).await;
                return Err(AppError::invalid_token(INVALID_TOKEN));
            }
            Err(e) if e.kind == ErrorKind::NotFound => {
                debug!(subject_id = claims.uid, "Token revoked or unknown");
                self.remember_invalid(raw_token, &claims).await;
                return Err(AppError::invalid_token(INVALID_TOKEN));
            }
            Err(e) => return Err(e),
        };

        let Some(identity) = self.identities.find_by_id(record.subject_id).await? else {
            debug!(subject_id = record.subject_id, "Token subject no longer exists");
            self.remember_invalid(raw_token, &claims).await;
            return Err(AppError::invalid_token(INVALID_TOKEN));
        };

        let expires_at = claims.expires_at().min(record.access_expires_at);
        if !self.warm_live(raw_token, &identity.snapshot(), expires_at).await? {
            debug!(subject_id = identity.id, "Token revoked during validation");
            return Err(AppError::invalid_token(INVALID_TOKEN));
        }
        self.touch_last_visit(identity.id);

        Ok(AuthenticatedIdentity {
            subject_id: identity.id,
            role: identity.role,
            phone: identity.phone,
        })
    }

    /// Authenticates by phone and password and issues a new token pair.
    ///
    /// An unknown phone and a wrong password fail identically.
    pub async fn login(&self, phone: &str, password: &str) -> AppResult<TokenPair> {
        let Some(identity) = self.identities.find_by_phone(phone).await? else {
            debug!("Login for unknown phone");
            return Err(AppError::invalid_credentials());
        };

        if !self
            .hasher
            .verify(password, &identity.password_salt, &identity.password_hash)?
        {
            debug!(subject_id = identity.id, "Login with wrong password");
            return Err(AppError::invalid_credentials());
        }

        let pair = self.issue(&identity).await?;
        info!(subject_id = identity.id, "Login successful");
        Ok(pair)
    }

    /// Exchanges a live refresh token for a new pair.
    ///
    /// The old row is left untouched: its access token stays valid until it
    /// expires and its refresh token can be exchanged again.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        if refresh_token.is_empty() {
            return Err(AppError::invalid_token(INVALID_TOKEN));
        }

        let record = match self.store.lookup_by_refresh(refresh_token).await {
            Ok(record) => record,
            Err(e) if e.kind == ErrorKind::NotFound => {
                debug!("Refresh token revoked, expired, or unknown");
                return Err(AppError::invalid_token(INVALID_TOKEN));
            }
            Err(e) => return Err(e),
        };

        let Some(identity) = self.identities.find_by_id(record.subject_id).await? else {
            debug!(subject_id = record.subject_id, "Refresh for missing subject");
            return Err(AppError::invalid_token(INVALID_TOKEN));
        };

        let pair = self.issue(&identity).await?;
        info!(subject_id = identity.id, "Token pair rotated");
        Ok(pair)
    }

    /// Revokes every session of `subject_id`.
    ///
    /// Enumerates live access tokens, nulls every refresh token, then purges
    /// the enumerated cache keys. All steps run even if one fails; any
    /// failure is logged and returned as `Internal`.
    pub async fn revoke_for_subject(&self, subject_id: i64) -> AppResult<()> {
        let mut failure: Option<AppError> = None;

        let keys: Vec<String> = match self.store.active_tokens(subject_id).await {
            Ok(rows) => rows.into_iter().map(|row| row.access_token).collect(),
            Err(e) => {
                error!(subject_id, error = %e, "Failed to enumerate active tokens");
                failure.get_or_insert(e);
                Vec::new()
            }
        };

        match self.store.revoke_all_for_subject(subject_id).await {
            Ok(rows) => debug!(subject_id, rows, "Refresh tokens revoked"),
            Err(e) => {
                error!(subject_id, error = %e, "Failed to revoke refresh tokens");
                failure.get_or_insert(e);
            }
        }

        match self.cache.purge(&keys).await {
            Ok(purged) => debug!(subject_id, purged, "Validation cache purged"),
            Err(e) => {
                error!(subject_id, error = %e, "Failed to purge validation cache");
                failure.get_or_insert(e);
            }
        }

        match failure {
            Some(e) => Err(revocation_failed(e)),
            None => {
                info!(subject_id, sessions = keys.len(), "Sessions revoked");
                Ok(())
            }
        }
    }

    /// Revokes the single session issued for `access_token` (logout).
    pub async fn revoke_single_token(&self, access_token: &str) -> AppResult<()> {
        let revoked = self.store.revoke_by_access_token(access_token).await;
        let purged = self.cache.purge(&[access_token.to_string()]).await;

        match revoked {
            Ok(()) => {}
            Err(e) if e.kind == ErrorKind::NotFound => {
                return Err(AppError::invalid_token(INVALID_TOKEN));
            }
            Err(e) => {
                error!(error = %e, "Failed to revoke session");
                return Err(revocation_failed(e));
            }
        }

        if let Err(e) = purged {
            error!(error = %e, "Failed to purge validation cache");
            return Err(revocation_failed(e));
        }
        Ok(())
    }

    /// Purges the cache entries of every unexpired token of `subject_id`.
    ///
    /// Used after a transaction that already nulled the subject's refresh
    /// tokens, so revoked rows are included.
    pub async fn purge_subject_cache(&self, subject_id: i64) -> AppResult<()> {
        let tokens = self.store.unexpired_access_tokens(subject_id).await.map_err(|e| {
            error!(subject_id, error = %e, "Failed to enumerate tokens for purge");
            revocation_failed(e)
        })?;

        let purged = self.cache.purge(&tokens).await.map_err(|e| {
            error!(subject_id, error = %e, "Failed to purge validation cache");
            revocation_failed(e)
        })?;

        debug!(subject_id, purged, "Validation cache purged");
        Ok(())
    }

    /// Signs, persists, then warms the cache, in that order.
    ///
    /// A pair revoked before the warm-up is re-checked is still returned; it
    /// fails validation like any other revoked pair.
    async fn issue(&self, identity: &Identity) -> AppResult<TokenPair> {
        let signed = self.signer.issue(identity)?;
        let refresh_token = self.refresh_tokens.generate();

        let record = self
            .store
            .create(
                identity.id,
                &signed.token,
                &refresh_token,
                self.signer.ttl(),
                self.refresh_ttl,
            )
            .await?;

        let expires_at = signed.claims.expires_at().min(record.access_expires_at);
        match self.warm_live(&signed.token, &identity.snapshot(), expires_at).await {
            Ok(true) => {}
            Ok(false) => debug!(subject_id = identity.id, "Pair revoked while being issued"),
            Err(e) => warn!(subject_id = identity.id, error = %e, "Failed to re-check issued pair"),
        }

        Ok(TokenPair {
            access_token: signed.token,
            refresh_token,
            access_expires_at: expires_at,
            refresh_expires_at: record.refresh_expires_at,
        })
    }

    /// A cached snapshot is trusted only for the subject the token names.
    fn trusted_snapshot(claims: &Claims, snapshot: IdentitySnapshot) -> Option<AuthenticatedIdentity> {
        if snapshot.subject_id != claims.uid {
            return None;
        }
        AuthenticatedIdentity::try_from(snapshot).ok()
    }

    async fn warm(&self, token: &str, snapshot: &IdentitySnapshot, expires_at: DateTime<Utc>) {
        if let Err(e) = self.cache.store_positive(token, snapshot, expires_at).await {
            warn!(subject_id = snapshot.subject_id, error = %e, "Failed to warm validation cache");
        }
    }

    /// Warms the cache, then re-reads the row.
    ///
    /// A revocation that completed between the first read and the warm-up
    /// has already run its purge, so the entry written here would outlive
    /// it. Returns `false` and drops the entry when the row is gone.
    async fn warm_live(
        &self,
        token: &str,
        snapshot: &IdentitySnapshot,
        expires_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.warm(token, snapshot, expires_at).await;

        match self.store.lookup_by_access(token).await {
            Ok(_) => Ok(true),
            Err(e) => {
                if let Err(purge_err) = self.cache.purge(&[token.to_string()]).await {
                    warn!(subject_id = snapshot.subject_id, error = %purge_err, "Failed to drop warmed cache entry");
                }
                if e.kind == ErrorKind::NotFound { Ok(false) } else { Err(e) }
            }
        }
    }

    async fn remember_invalid(&self, token: &str, claims: &Claims) {
        if let Err(e) = self.cache.store_negative(token, claims.expires_at()).await {
            warn!(subject_id = claims.uid, error = %e, "Failed to cache invalid token");
        }
    }

    fn touch_last_visit(&self, subject_id: i64) {
        let identities = Arc::clone(&self.identities);
        tokio::spawn(async move {
            if let Err(e) = identities.touch_last_visit(subject_id).await {
                warn!(subject_id, error = %e, "Failed to record last visit");
            }
        });
    }
}

fn revocation_failed(cause: AppError) -> AppError {
    AppError::with_source(ErrorKind::Internal, "Session revocation failed", cause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokengate_cache::memory::MemoryCacheProvider;
    use tokengate_core::config::MemoryCacheConfig;
    use tokengate_core::traits::cache::CacheProvider;
    use tokengate_database::Stores;
    use tokengate_entity::{NewIdentity, RefreshTokenRecord, Role};

    use crate::password::Argon2CredentialHasher;

    const PHONE: &str = "79990000001";
    const PASSWORD: &str = "secret1";
    const REFRESH_TTL: Duration = Duration::from_secs(3600);

    #[derive(Debug)]
    struct UnavailableCache;

    #[async_trait]
    impl CacheProvider for UnavailableCache {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::new(ErrorKind::Cache, "cache unavailable"))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
            Err(AppError::new(ErrorKind::Cache, "cache unavailable"))
        }

        async fn delete_many(&self, _keys: &[String]) -> AppResult<u64> {
            Err(AppError::new(ErrorKind::Cache, "cache unavailable"))
        }

        async fn health_check(&self) -> AppResult<bool> {
            Ok(false)
        }
    }

    /// Holds each `create` and `lookup_by_access` open after the row has
    /// been read or written, widening the window for a concurrent revoke.
    #[derive(Debug)]
    struct SlowStore {
        inner: Arc<dyn RefreshStore>,
        delay: Duration,
    }

    #[async_trait]
    impl RefreshStore for SlowStore {
        async fn create(
            &self,
            subject_id: i64,
            access_token: &str,
            refresh_token: &str,
            access_ttl: Duration,
            refresh_ttl: Duration,
        ) -> AppResult<RefreshTokenRecord> {
            let record = self
                .inner
                .create(subject_id, access_token, refresh_token, access_ttl, refresh_ttl)
                .await;
            tokio::time::sleep(self.delay).await;
            record
        }

        async fn lookup_by_refresh(&self, refresh_token: &str) -> AppResult<RefreshTokenRecord> {
            self.inner.lookup_by_refresh(refresh_token).await
        }

        async fn lookup_by_access(&self, access_token: &str) -> AppResult<RefreshTokenRecord> {
            let record = self.inner.lookup_by_access(access_token).await;
            tokio::time::sleep(self.delay).await;
            record
        }

        async fn revoke_all_for_subject(&self, subject_id: i64) -> AppResult<u64> {
            self.inner.revoke_all_for_subject(subject_id).await
        }

        async fn revoke_by_access_token(&self, access_token: &str) -> AppResult<()> {
            self.inner.revoke_by_access_token(access_token).await
        }

        async fn active_tokens(&self, subject_id: i64) -> AppResult<Vec<RefreshTokenRecord>> {
            self.inner.active_tokens(subject_id).await
        }

        async fn unexpired_access_tokens(&self, subject_id: i64) -> AppResult<Vec<String>> {
            self.inner.unexpired_access_tokens(subject_id).await
        }
    }

    struct Harness {
        manager: SessionManager,
        stores: Stores,
        hasher: Arc<Argon2CredentialHasher>,
        signer: Arc<TokenSigner>,
    }

    impl Harness {
        fn new(provider: Arc<dyn CacheProvider>, access_ttl: Duration) -> Self {
            Self::with_refresh_store(provider, access_ttl, |store| store)
        }

        fn with_refresh_store(
            provider: Arc<dyn CacheProvider>,
            access_ttl: Duration,
            wrap: impl FnOnce(Arc<dyn RefreshStore>) -> Arc<dyn RefreshStore>,
        ) -> Self {
            let stores = Stores::in_memory();
            let hasher = Arc::new(Argon2CredentialHasher::fast(b"pepper", 16));
            let signer = Arc::new(TokenSigner::with_ttl(b"signing-secret", access_ttl));
            let manager = SessionManager::new(
                Arc::clone(&signer),
                hasher.clone(),
                Arc::clone(&stores.identities),
                wrap(Arc::clone(&stores.refresh)),
                ValidationCache::new(provider, access_ttl),
                REFRESH_TTL,
            );
            Self {
                manager,
                stores,
                hasher,
                signer,
            }
        }

        fn memory() -> Self {
            let provider = Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
            Self::new(provider, Duration::from_secs(900))
        }

        fn slow_store(delay: Duration) -> Self {
            let provider = Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
            Self::with_refresh_store(provider, Duration::from_secs(900), |inner| {
                Arc::new(SlowStore { inner, delay })
            })
        }

        async fn register(&self, phone: &str, password: &str) -> Identity {
            let salt = self.hasher.new_salt();
            let password_hash = self.hasher.hash(password, &salt).unwrap();
            self.stores
                .identities
                .create(NewIdentity {
                    phone: phone.to_string(),
                    password_hash,
                    password_salt: salt,
                    role: Role::User,
                })
                .await
                .unwrap()
        }
    }

    fn assert_invalid_token(result: AppResult<AuthenticatedIdentity>) {
        assert_eq!(result.unwrap_err().kind, ErrorKind::InvalidToken);
    }

    #[tokio::test]
    async fn test_login_then_validate() {
        let h = Harness::memory();
        let user = h.register(PHONE, PASSWORD).await;

        let pair = h.manager.login(PHONE, PASSWORD).await.unwrap();
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());

        let identity = h.manager.validate(&pair.access_token).await.unwrap();
        assert_eq!(identity.subject_id, user.id);
        assert_eq!(identity.role, Role::User);
        assert_eq!(identity.phone, PHONE);
    }

    #[tokio::test]
    async fn test_login_warms_cache() {
        let h = Harness::memory();
        let user = h.register(PHONE, PASSWORD).await;
        let pair = h.manager.login(PHONE, PASSWORD).await.unwrap();

        assert_eq!(
            h.manager.cache.lookup(&pair.access_token).await,
            CacheLookup::PositiveHit(user.snapshot())
        );
    }

    #[tokio::test]
    async fn test_bad_credentials_are_indistinguishable() {
        let h = Harness::memory();
        h.register(PHONE, PASSWORD).await;

        let wrong_password = h.manager.login(PHONE, "nope").await.unwrap_err();
        let unknown_phone = h.manager.login("70000000000", PASSWORD).await.unwrap_err();

        assert_eq!(wrong_password.kind, ErrorKind::InvalidCredentials);
        assert_eq!(unknown_phone.kind, ErrorKind::InvalidCredentials);
        assert_eq!(wrong_password.message, unknown_phone.message);
    }

    #[tokio::test]
    async fn test_empty_and_garbage_tokens_invalid() {
        let h = Harness::memory();
        assert_invalid_token(h.manager.validate("").await);
        assert_invalid_token(h.manager.validate("garbage").await);
    }

    #[tokio::test]
    async fn test_token_at_expiry_instant_is_invalid() {
        let provider = Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
        let h = Harness::new(provider, Duration::ZERO);
        h.register(PHONE, PASSWORD).await;

        let pair = h.manager.login(PHONE, PASSWORD).await.unwrap();
        assert_invalid_token(h.manager.validate(&pair.access_token).await);
    }

    #[tokio::test]
    async fn test_cache_miss_falls_back_to_store() {
        let h = Harness::memory();
        let user = h.register(PHONE, PASSWORD).await;
        let pair = h.manager.login(PHONE, PASSWORD).await.unwrap();

        h.manager.cache.purge(&[pair.access_token.clone()]).await.unwrap();
        assert_eq!(h.manager.cache.lookup(&pair.access_token).await, CacheLookup::Miss);

        let identity = h.manager.validate(&pair.access_token).await.unwrap();
        assert_eq!(identity.subject_id, user.id);
        assert_eq!(
            h.manager.cache.lookup(&pair.access_token).await,
            CacheLookup::PositiveHit(user.snapshot())
        );
    }

    #[tokio::test]
    async fn test_unknown_signed_token_cached_as_negative() {
        let h = Harness::memory();
        let user = h.register(PHONE, PASSWORD).await;
        let stray = h.signer.issue(&user).unwrap();

        assert_invalid_token(h.manager.validate(&stray.token).await);
        assert_eq!(h.manager.cache.lookup(&stray.token).await, CacheLookup::NegativeHit);
        assert_invalid_token(h.manager.validate(&stray.token).await);
    }

    #[tokio::test]
    async fn test_revoke_invalidates_concurrent_logins() {
        let h = Harness::memory();
        let user = h.register(PHONE, PASSWORD).await;

        let (a, b) = tokio::join!(
            h.manager.login(PHONE, PASSWORD),
            h.manager.login(PHONE, PASSWORD)
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.refresh_token, b.refresh_token);
        assert_eq!(h.stores.refresh.active_tokens(user.id).await.unwrap().len(), 2);

        h.manager.validate(&a.access_token).await.unwrap();
        h.manager.revoke_for_subject(user.id).await.unwrap();

        assert_invalid_token(h.manager.validate(&a.access_token).await);
        assert_invalid_token(h.manager.validate(&b.access_token).await);
        assert!(h.signer.verify(&a.access_token).is_ok());
        assert_eq!(
            h.manager.refresh(&a.refresh_token).await.unwrap_err().kind,
            ErrorKind::InvalidToken
        );
    }

    #[tokio::test]
    async fn test_revoke_during_validation_leaves_no_positive_entry() {
        let h = Harness::slow_store(Duration::from_millis(200));
        let user = h.register(PHONE, PASSWORD).await;
        let pair = h.manager.login(PHONE, PASSWORD).await.unwrap();
        h.manager.cache.purge(&[pair.access_token.clone()]).await.unwrap();

        let manager = h.manager.clone();
        let token = pair.access_token.clone();
        let pending = tokio::spawn(async move { manager.validate(&token).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        h.manager.revoke_for_subject(user.id).await.unwrap();

        assert_invalid_token(pending.await.unwrap());
        assert!(!matches!(
            h.manager.cache.lookup(&pair.access_token).await,
            CacheLookup::PositiveHit(_)
        ));
        assert_invalid_token(h.manager.validate(&pair.access_token).await);
    }

    #[tokio::test]
    async fn test_revoke_during_login_leaves_no_positive_entry() {
        let h = Harness::slow_store(Duration::from_millis(200));
        let user = h.register(PHONE, PASSWORD).await;

        let manager = h.manager.clone();
        let pending = tokio::spawn(async move { manager.login(PHONE, PASSWORD).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        h.manager.revoke_for_subject(user.id).await.unwrap();

        let pair = pending.await.unwrap().unwrap();
        assert!(!matches!(
            h.manager.cache.lookup(&pair.access_token).await,
            CacheLookup::PositiveHit(_)
        ));
        assert_invalid_token(h.manager.validate(&pair.access_token).await);
    }

    #[tokio::test]
    async fn test_revoke_without_sessions_is_idempotent() {
        let h = Harness::memory();
        let user = h.register(PHONE, PASSWORD).await;
        h.manager.revoke_for_subject(user.id).await.unwrap();
        h.manager.revoke_for_subject(user.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_leaves_old_row() {
        let h = Harness::memory();
        let user = h.register(PHONE, PASSWORD).await;
        let first = h.manager.login(PHONE, PASSWORD).await.unwrap();

        let second = h.manager.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.access_token, first.access_token);
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(h.manager.validate(&second.access_token).await.unwrap().subject_id, user.id);

        // The previous pair is not revoked by rotation.
        assert!(h.manager.validate(&first.access_token).await.is_ok());
        let third = h.manager.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(third.refresh_token, second.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_token() {
        let h = Harness::memory();
        for token in ["", "does-not-exist"] {
            let err = h.manager.refresh(token).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidToken);
        }
    }

    #[tokio::test]
    async fn test_password_change_invalidates_outstanding_tokens() {
        let h = Harness::memory();
        let user = h.register(PHONE, PASSWORD).await;
        let a = h.manager.login(PHONE, PASSWORD).await.unwrap();
        let b = h.manager.login(PHONE, PASSWORD).await.unwrap();
        h.manager.validate(&a.access_token).await.unwrap();

        let salt = h.hasher.new_salt();
        let digest = h.hasher.hash("secret2", &salt).unwrap();
        h.stores.identities.update_password(user.id, &digest, &salt).await.unwrap();
        h.manager.purge_subject_cache(user.id).await.unwrap();

        assert_invalid_token(h.manager.validate(&a.access_token).await);
        assert_invalid_token(h.manager.validate(&b.access_token).await);
        assert!(h.manager.login(PHONE, "secret2").await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_revokes_only_that_session() {
        let h = Harness::memory();
        h.register(PHONE, PASSWORD).await;
        let a = h.manager.login(PHONE, PASSWORD).await.unwrap();
        let b = h.manager.login(PHONE, PASSWORD).await.unwrap();

        h.manager.revoke_single_token(&a.access_token).await.unwrap();

        assert_invalid_token(h.manager.validate(&a.access_token).await);
        assert!(h.manager.validate(&b.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_deleted_subject_token_invalid() {
        let h = Harness::memory();
        let user = h.register(PHONE, PASSWORD).await;
        let pair = h.manager.login(PHONE, PASSWORD).await.unwrap();

        h.stores.identities.soft_delete(user.id).await.unwrap();
        h.manager.purge_subject_cache(user.id).await.unwrap();

        assert_invalid_token(h.manager.validate(&pair.access_token).await);
    }

    #[tokio::test]
    async fn test_validation_records_last_visit() {
        let h = Harness::memory();
        let user = h.register(PHONE, PASSWORD).await;
        let pair = h.manager.login(PHONE, PASSWORD).await.unwrap();

        h.manager.validate(&pair.access_token).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let stored = h.stores.identities.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.last_visited_at.is_some());
    }

    #[tokio::test]
    async fn test_unavailable_cache_degrades_gracefully() {
        let h = Harness::new(Arc::new(UnavailableCache), Duration::from_secs(900));
        let user = h.register(PHONE, PASSWORD).await;

        let pair = h.manager.login(PHONE, PASSWORD).await.unwrap();
        assert_eq!(h.manager.validate(&pair.access_token).await.unwrap().subject_id, user.id);

        let err = h.manager.revoke_for_subject(user.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);

        // The store step still ran.
        assert_invalid_token(h.manager.validate(&pair.access_token).await);
    }
}
