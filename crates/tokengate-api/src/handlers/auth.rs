//! Auth handlers: registration, login, refresh, logout, me.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use tokengate_auth::TokenPair;

use crate::dto::request::{LoginRequest, RefreshRequest, RegistrationRequest};
use crate::dto::response::{ApiResponse, IdentityResponse, MessageResponse, WhoAmIResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, BearerToken, ValidatedJson};
use crate::state::AppState;

/// POST /v1/idm/registration
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegistrationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IdentityResponse>>), ApiError> {
    let identity = state.accounts.register(&req.phone, &req.password).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(identity.into()))))
}

/// POST /v1/idm/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let pair = state.sessions.login(req.phone.trim(), &req.password).await?;
    Ok(Json(ApiResponse::ok(pair)))
}

/// POST /v1/idm/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let pair = state.sessions.refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok(pair)))
}

/// POST /v1/idm/logout
///
/// Revokes only the pair the caller authenticated with.
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.sessions.revoke_single_token(&token).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Logged out"))))
}

/// GET /v1/idm/me
pub async fn me(auth: AuthUser) -> Json<ApiResponse<WhoAmIResponse>> {
    Json(ApiResponse::ok(auth.0.into()))
}
