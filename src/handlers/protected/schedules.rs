// handlers/protected/schedules.rs - /api/v1/schedules handlers

use axum::extract::State;
use uuid::Uuid;

use super::{own_scope, require_teacher};
use crate::cache::{list_key, resource};
use crate::database::models::schedule::{CreateSchedule, Schedule, ScheduleFilter};
use crate::database::pagination::{Paged, Pagination};
use crate::error::ApiError;
use crate::middleware::{AnyUser, ApiResponse, ApiResult, JsonBody, PathParam, QueryParams};
use crate::services::ScheduleService;
use crate::state::AppState;

/// GET /schedules
pub async fn list(
    State(state): State<AppState>,
    auth: AnyUser,
    QueryParams(mut filter): QueryParams<ScheduleFilter>,
) -> ApiResult<Paged<Schedule>> {
    filter.teacher_id = own_scope(&auth, filter.teacher_id);
    let page = Pagination::new(filter.page, filter.limit);
    let service = ScheduleService::new(state.pool.clone());

    let schedules = state
        .cache
        .remember(&list_key(resource::SCHEDULES, &filter), || service.list(&filter, page))
        .await?;
    Ok(ApiResponse::success(schedules))
}

/// POST /schedules - teachers add their own slots; staff name the teacher
pub async fn create(
    State(state): State<AppState>,
    auth: AnyUser,
    JsonBody(input): JsonBody<CreateSchedule>,
) -> ApiResult<Schedule> {
    input.validate()?;
    let teacher_id = if auth.is_staff() {
        let teacher_id = input
            .teacher_id
            .ok_or_else(|| ApiError::bad_request("teacher_id is required"))?;
        require_teacher(&state, teacher_id).await?;
        teacher_id
    } else {
        auth.id
    };

    let schedule = ScheduleService::new(state.pool.clone()).create(teacher_id, &input).await?;
    state.cache.invalidate(&[resource::SCHEDULES]).await;
    Ok(ApiResponse::created(schedule))
}

/// DELETE /schedules/:id
pub async fn delete(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    let service = ScheduleService::new(state.pool.clone());
    let schedule = service.get(id).await?;
    auth.ensure_self_or_staff(schedule.teacher_id)?;

    service.delete(id).await?;
    state.cache.invalidate(&[resource::SCHEDULES]).await;
    Ok(ApiResponse::<()>::no_content())
}
