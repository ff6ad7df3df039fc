// handlers/protected/attendance.rs - /api/v1/attendance handlers

use axum::extract::State;
use uuid::Uuid;

use super::own_scope;
use crate::cache::{item_key, list_key, resource};
use crate::database::models::attendance::{Attendance, AttendanceFilter, CreateAttendance, UpdateAttendance};
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{AnyUser, ApiResponse, ApiResult, JsonBody, PathParam, QueryParams};
use crate::services::{AttendanceService, ClassService};
use crate::state::AppState;

const DEPENDENTS: &[&str] = &[resource::ATTENDANCE, resource::DASHBOARD];

async fn load_owned(state: &AppState, auth: &AnyUser, id: Uuid) -> Result<Attendance, ApiError> {
    let service = AttendanceService::new(state.pool.clone());
    let record = state
        .cache
        .remember(&item_key(resource::ATTENDANCE, id), || service.get(id))
        .await?;
    auth.ensure_self_or_staff(record.teacher_id)?;
    Ok(record)
}

/// GET /attendance
pub async fn list(
    State(state): State<AppState>,
    auth: AnyUser,
    QueryParams(mut filter): QueryParams<AttendanceFilter>,
) -> ApiResult<Paged<Attendance>> {
    filter.teacher_id = own_scope(&auth, filter.teacher_id);
    let page = Pagination::new(filter.page, filter.limit);
    let service = AttendanceService::new(state.pool.clone());

    let records = state
        .cache
        .remember(&list_key(resource::ATTENDANCE, &filter), || service.list(&filter, page))
        .await?;
    Ok(ApiResponse::success(records))
}

/// POST /attendance - one record per class and student; a second one is 409
pub async fn create(
    State(state): State<AppState>,
    auth: AnyUser,
    JsonBody(input): JsonBody<CreateAttendance>,
) -> ApiResult<Attendance> {
    let class = match ClassService::new(state.pool.clone()).get(input.class_id).await {
        Ok(class) => class,
        Err(DatabaseError::NotFound(_)) => {
            return Err(ApiError::bad_request(format!("class_id {} does not exist", input.class_id)))
        }
        Err(e) => return Err(e.into()),
    };
    auth.ensure_self_or_staff(class.teacher_id)?;

    let record = AttendanceService::new(state.pool.clone()).create(&class, input).await?;
    state.cache.invalidate(DEPENDENTS).await;
    Ok(ApiResponse::created(record))
}

/// PATCH /attendance/:id
pub async fn update(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(patch): JsonBody<UpdateAttendance>,
) -> ApiResult<Attendance> {
    load_owned(&state, &auth, id).await?;

    let record = AttendanceService::new(state.pool.clone()).update(id, patch).await?;
    state.cache.invalidate(DEPENDENTS).await;
    Ok(ApiResponse::success(record))
}

/// DELETE /attendance/:id
pub async fn delete(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    load_owned(&state, &auth, id).await?;

    AttendanceService::new(state.pool.clone()).delete(id).await?;
    state.cache.invalidate(DEPENDENTS).await;
    Ok(ApiResponse::<()>::no_content())
}
