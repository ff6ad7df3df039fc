// handlers/protected/teachers.rs - /api/v1/teachers handlers

use axum::extract::State;
use uuid::Uuid;

use crate::cache::{item_key, list_key, resource};
use crate::database::models::student::{Student, StudentFilter};
use crate::database::models::user::{UpdateUser, UserFilter, UserProfile};
use crate::database::pagination::{Paged, Pagination};
use crate::middleware::{AnyUser, ApiResponse, ApiResult, JsonBody, PathParam, QueryParams, StaffUser};
use crate::services::{StudentService, UserService};
use crate::state::AppState;
use crate::types::Role;

const TEACHER: &[Role] = &[Role::Teacher];

/// GET /teachers
pub async fn list(
    State(state): State<AppState>,
    _staff: StaffUser,
    QueryParams(filter): QueryParams<UserFilter>,
) -> ApiResult<Paged<UserProfile>> {
    let page = Pagination::new(filter.page, filter.limit);
    let service = UserService::new(state.pool.clone());

    let teachers = state
        .cache
        .remember(&list_key(resource::TEACHERS, &filter), || service.list(TEACHER, &filter, page))
        .await?;
    Ok(ApiResponse::success(teachers))
}

/// GET /teachers/:id - staff, or the teacher themselves
pub async fn get(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<UserProfile> {
    auth.ensure_self_or_staff(id)?;
    let service = UserService::new(state.pool.clone());

    let teacher = state
        .cache
        .remember(&item_key(resource::TEACHERS, id), || async move {
            service.get_with_role(id, TEACHER).await.map(UserProfile::from)
        })
        .await?;
    Ok(ApiResponse::success(teacher))
}

/// PATCH /teachers/:id
pub async fn update(
    State(state): State<AppState>,
    _staff: StaffUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(patch): JsonBody<UpdateUser>,
) -> ApiResult<UserProfile> {
    patch.validate()?;
    let service = UserService::new(state.pool.clone());
    service.get_with_role(id, TEACHER).await?;

    let teacher = service.update(id, patch).await?;
    // Conversation lists carry the teacher's name
    state
        .cache
        .invalidate(&[resource::TEACHERS, resource::MESSAGES, resource::DASHBOARD])
        .await;
    Ok(ApiResponse::success(UserProfile::from(teacher)))
}

/// DELETE /teachers/:id - their students become unassigned; refused while
/// classes or payouts still reference the teacher
pub async fn delete(
    State(state): State<AppState>,
    _staff: StaffUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    let service = UserService::new(state.pool.clone());
    service.get_with_role(id, TEACHER).await?;
    service.delete(id).await?;

    state
        .cache
        .invalidate(&[
            resource::TEACHERS,
            resource::STUDENTS,
            resource::SCHEDULES,
            resource::NOTIFICATIONS,
            resource::MESSAGES,
            resource::APPLICATIONS,
            resource::DASHBOARD,
        ])
        .await;
    Ok(ApiResponse::<()>::no_content())
}

/// GET /teachers/:id/students
pub async fn students(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
    QueryParams(mut filter): QueryParams<StudentFilter>,
) -> ApiResult<Paged<Student>> {
    auth.ensure_self_or_staff(id)?;
    UserService::new(state.pool.clone()).get_with_role(id, TEACHER).await?;

    filter.teacher_id = Some(id);
    let page = Pagination::new(filter.page, filter.limit);
    let service = StudentService::new(state.pool.clone());

    let students = state
        .cache
        .remember(&list_key(resource::STUDENTS, &filter), || service.list(&filter, page))
        .await?;
    Ok(ApiResponse::success(students))
}
