//! TokenGate server: phone/password identity with JWT access tokens,
//! rotating refresh tokens, and cached token validation.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use tokengate_api::AppState;
use tokengate_auth::{Argon2CredentialHasher, AuthorizationGate, SessionManager, TokenSigner};
use tokengate_cache::{CacheManager, ValidationCache};
use tokengate_core::config::AppConfig;
use tokengate_core::error::AppError;
use tokengate_database::Stores;
use tokengate_service::{AccountService, AdminAccountService};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from `TOKENGATE_CONFIG_DIR` (default `config`) and
/// the overlay named by `TOKENGATE_ENV` (default `development`).
fn load_configuration() -> Result<AppConfig, AppError> {
    let dir = std::env::var("TOKENGATE_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let env = std::env::var("TOKENGATE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&dir, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting TokenGate");

    // ── Step 1: Durable stores (+ migrations for Postgres) ───────
    info!(provider = %config.database.provider, "Connecting store");
    let stores = Stores::connect(&config.database).await?;

    // ── Step 2: Validation cache backend ─────────────────────────
    info!(provider = %config.cache.provider, "Initializing cache");
    let cache = CacheManager::new(&config.cache).await?;

    // ── Step 3: Auth system ──────────────────────────────────────
    let access_ttl = config.auth.access_ttl();
    let hasher = Arc::new(Argon2CredentialHasher::new(&config.auth));
    let signer = Arc::new(TokenSigner::new(&config.auth));
    let sessions = Arc::new(SessionManager::new(
        signer,
        hasher.clone(),
        Arc::clone(&stores.identities),
        Arc::clone(&stores.refresh),
        ValidationCache::new(Arc::new(cache.clone()), access_ttl),
        config.auth.refresh_ttl(),
    ));
    let gate = Arc::new(AuthorizationGate::new());

    // ── Step 4: Services ─────────────────────────────────────────
    let accounts = Arc::new(AccountService::new(
        Arc::clone(&stores.identities),
        hasher,
        config.auth.salt_size,
        Arc::clone(&sessions),
        Arc::clone(&gate),
    ));
    let admin = Arc::new(AdminAccountService::new(
        Arc::clone(&stores.identities),
        Arc::clone(&sessions),
        gate,
    ));

    // ── Step 5: HTTP server ──────────────────────────────────────
    let state = AppState {
        stores,
        cache,
        sessions,
        accounts,
        admin,
    };
    let app = tokengate_api::build_app(state, &config.server.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(%addr, "TokenGate listening");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => return server_outcome(result),
        _ = shutdown_signal() => {}
    }

    info!("Shutdown signal received, draining connections");
    let _ = shutdown_tx.send(true);

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => server_outcome(result)?,
        Err(_) => {
            warn!(grace_seconds = grace.as_secs(), "Grace period elapsed, aborting open connections");
            server.abort();
        }
    }

    info!("TokenGate shut down gracefully");
    Ok(())
}

fn server_outcome(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(AppError::internal(format!("Server error: {e}"))),
        Err(e) => Err(AppError::internal(format!("Server task failed: {e}"))),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
