//! Route definitions for the TokenGate HTTP API.
//!
//! Everything is mounted under `/v1/idm`. Authenticated routes sit behind
//! [`middleware::auth::require_auth`], which validates tokens with the
//! session manager carried in `AppState`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Build the router with all routes, the auth middleware, and request logging.
pub fn build_router(state: AppState) -> Router {
    let protected = protected_routes().route_layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::require_auth,
    ));

    let idm = Router::new().merge(public_routes()).merge(protected);

    Router::new()
        .nest("/v1/idm", idm)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Registration, login, refresh, and liveness
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/registration", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/ping", get(handlers::health::ping))
}

/// Routes requiring a valid access token
fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        .route("/update", post(handlers::account::update))
        .route("/reset_token", post(handlers::account::reset_token))
        .route("/delete_user", post(handlers::account::delete_user))
        .route("/digup_user", post(handlers::account::dig_up_user))
        .route("/change_role", post(handlers::admin::change_role))
        .route("/users", get(handlers::admin::list_users))
}
