//! Health check handler.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use tokengate_core::traits::cache::CacheProvider;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /v1/idm/ping
///
/// Always 200; an unreachable store or cache reports `degraded`.
pub async fn ping(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let database = state.stores.health_check().await.unwrap_or_else(|e| {
        warn!(error = %e, "Store health check failed");
        false
    });
    let cache = state.cache.health_check().await.unwrap_or_else(|e| {
        warn!(error = %e, "Cache health check failed");
        false
    });

    Json(ApiResponse::ok(HealthResponse {
        status: if database && cache { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        cache,
    }))
}
