//! Shared application state passed to all handlers via Axum's `State` extractor.

use std::sync::Arc;

use tokengate_auth::SessionManager;
use tokengate_cache::CacheManager;
use tokengate_database::Stores;
use tokengate_service::{AccountService, AdminAccountService};

/// Application state shared across all request handlers.
///
/// Cloned per request; every field is cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Infrastructure ───────────────────────────────────────────
    /// Durable stores, probed by the health endpoint.
    pub stores: Stores,
    /// Cache backend, probed by the health endpoint.
    pub cache: CacheManager,

    // ── Auth ─────────────────────────────────────────────────────
    /// Token issuance, validation, and revocation.
    pub sessions: Arc<SessionManager>,

    // ── Services ─────────────────────────────────────────────────
    /// Self-service account operations.
    pub accounts: Arc<AccountService>,
    /// Admin-only account operations.
    pub admin: Arc<AdminAccountService>,
}
