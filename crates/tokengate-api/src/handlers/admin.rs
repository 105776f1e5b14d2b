//! Admin handlers.

use axum::Json;
use axum::extract::{Query, State};

use crate::dto::request::ChangeRoleRequest;
use crate::dto::response::{ApiResponse, IdentityResponse, PaginatedResponse, RoleResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// POST /v1/idm/change_role
pub async fn change_role(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<RoleResponse>>, ApiError> {
    let role = state
        .admin
        .change_role(&auth, req.user_id, req.role.trim())
        .await?;
    Ok(Json(ApiResponse::ok(RoleResponse {
        user_id: req.user_id,
        role,
    })))
}

/// GET /v1/idm/users?limit&offset
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<IdentityResponse>>>, ApiError> {
    let request = params.into_page_request();
    let page = state.admin.list(&auth, request).await?;
    Ok(Json(ApiResponse::ok(PaginatedResponse::from_page(
        page.map(IdentityResponse::from),
        request,
    ))))
}
