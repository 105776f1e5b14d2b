//! Self-service account handlers.

use axum::Json;
use axum::extract::State;

use tokengate_service::AccountUpdate;

use crate::dto::request::{ResetTokenRequest, UpdateRequest, UserIdRequest};
use crate::dto::response::{ApiResponse, IdentityResponse, MessageResponse, ResetResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /v1/idm/update
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let update = AccountUpdate {
        password: req.password,
        phone: req.phone,
    };
    state.accounts.update(&auth, update).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Account updated; sign in again",
    ))))
}

/// POST /v1/idm/reset_token
pub async fn reset_token(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ResetTokenRequest>,
) -> Result<Json<ApiResponse<ResetResponse>>, ApiError> {
    let user_id = state.accounts.reset_tokens(&auth, req.user_id).await?;
    Ok(Json(ApiResponse::ok(ResetResponse { user_id })))
}

/// POST /v1/idm/delete_user
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UserIdRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.accounts.delete(&auth, req.user_id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("User deleted"))))
}

/// POST /v1/idm/digup_user
pub async fn dig_up_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UserIdRequest>,
) -> Result<Json<ApiResponse<IdentityResponse>>, ApiError> {
    let identity = state.accounts.dig_up(&auth, req.user_id).await?;
    Ok(Json(ApiResponse::ok(identity.into())))
}
