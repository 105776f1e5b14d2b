//! Bearer-token authentication middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use tokengate_core::error::AppError;

use crate::error::ApiError;
use crate::extractors::BearerToken;
use crate::extractors::auth::bearer_token;
use crate::state::AppState;

/// Validates the bearer token through the session manager held in `AppState`.
///
/// On success the [`tokengate_entity::AuthenticatedIdentity`] and the raw
/// token are inserted into request extensions. Invalid tokens yield 401,
/// store failures 500.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .map(str::to_string)
        .ok_or_else(|| AppError::invalid_token("Missing or malformed Authorization header"))?;

    let identity = state.sessions.validate(&token).await.map_err(|e| {
        debug!(kind = %e.kind, "Request rejected by auth middleware");
        e
    })?;

    let extensions = request.extensions_mut();
    extensions.insert(identity);
    extensions.insert(BearerToken(token));

    Ok(next.run(request).await)
}
