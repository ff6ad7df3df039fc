// handlers/protected/admins.rs - /api/v1/admins handlers (super_admin only)

use axum::extract::State;
use uuid::Uuid;

use crate::cache::{list_key, resource};
use crate::database::models::user::{UserFilter, UserProfile};
use crate::database::pagination::{Paged, Pagination};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, PathParam, QueryParams, SuperAdminUser};
use crate::services::UserService;
use crate::state::AppState;
use crate::types::Role;

const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

/// GET /admins - admins and super admins
pub async fn list(
    State(state): State<AppState>,
    _auth: SuperAdminUser,
    QueryParams(filter): QueryParams<UserFilter>,
) -> ApiResult<Paged<UserProfile>> {
    let page = Pagination::new(filter.page, filter.limit);
    let service = UserService::new(state.pool.clone());

    let admins = state
        .cache
        .remember(&list_key(resource::ADMINS, &filter), || service.list(ADMIN_ROLES, &filter, page))
        .await?;
    Ok(ApiResponse::success(admins))
}

/// DELETE /admins/:id - a super admin cannot delete their own account
pub async fn delete(
    State(state): State<AppState>,
    auth: SuperAdminUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    if id == auth.id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    let service = UserService::new(state.pool.clone());
    service.get_with_role(id, ADMIN_ROLES).await?;
    service.delete(id).await?;

    tracing::info!(admin_id = %id, by = %auth.id, "Deleted admin account");
    state
        .cache
        .invalidate(&[
            resource::ADMINS,
            resource::NOTIFICATIONS,
            resource::MESSAGES,
            resource::APPLICATIONS,
        ])
        .await;
    Ok(ApiResponse::<()>::no_content())
}
