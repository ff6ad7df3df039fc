// handlers/protected/applications.rs - GET /api/v1/applications, PATCH /api/v1/applications/:id

use axum::extract::State;
use uuid::Uuid;

use crate::cache::{list_key, resource};
use crate::database::models::application::{ApplicationFilter, ReviewApplication, TeacherApplication};
use crate::database::pagination::{Paged, Pagination};
use crate::middleware::{ApiResponse, ApiResult, JsonBody, PathParam, QueryParams, StaffUser};
use crate::services::ApplicationService;
use crate::state::AppState;

/// GET /applications
pub async fn list(
    State(state): State<AppState>,
    _staff: StaffUser,
    QueryParams(filter): QueryParams<ApplicationFilter>,
) -> ApiResult<Paged<TeacherApplication>> {
    let page = Pagination::new(filter.page, filter.limit);
    let service = ApplicationService::new(state.pool.clone());

    let applications = state
        .cache
        .remember(&list_key(resource::APPLICATIONS, &filter), || service.list(&filter, page))
        .await?;
    Ok(ApiResponse::success(applications))
}

/// PATCH /applications/:id - records the decision and the reviewer
pub async fn review(
    State(state): State<AppState>,
    auth: StaffUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(input): JsonBody<ReviewApplication>,
) -> ApiResult<TeacherApplication> {
    let application = ApplicationService::new(state.pool.clone())
        .review(id, input.status, auth.id)
        .await?;

    tracing::info!(application_id = %id, status = %application.status, by = %auth.id, "Reviewed application");
    state
        .cache
        .invalidate(&[resource::APPLICATIONS, resource::DASHBOARD])
        .await;
    Ok(ApiResponse::success(application))
}
