// handlers/protected/students.rs - /api/v1/students handlers

use axum::extract::State;
use uuid::Uuid;

use super::{own_scope, require_teacher};
use crate::cache::{item_key, list_key, resource};
use crate::database::models::student::{CreateStudent, Student, StudentFilter, UpdateStudent};
use crate::database::pagination::{Paged, Pagination};
use crate::error::ApiError;
use crate::middleware::{AnyUser, ApiResponse, ApiResult, AuthUser, JsonBody, PathParam, QueryParams, StaffUser};
use crate::services::StudentService;
use crate::state::AppState;

/// Every cache a student write can make stale
const DEPENDENTS: &[&str] = &[
    resource::STUDENTS,
    resource::CLASSES,
    resource::ATTENDANCE,
    resource::BOOK_ASSIGN,
    resource::DASHBOARD,
];

fn ensure_visible(user: &AuthUser, student: &Student) -> Result<(), ApiError> {
    if user.is_staff() || student.teacher_id == Some(user.id) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You can only access your own students"))
    }
}

/// GET /students - teachers only ever see students assigned to them
pub async fn list(
    State(state): State<AppState>,
    auth: AnyUser,
    QueryParams(mut filter): QueryParams<StudentFilter>,
) -> ApiResult<Paged<Student>> {
    filter.teacher_id = own_scope(&auth, filter.teacher_id);
    let page = Pagination::new(filter.page, filter.limit);
    let service = StudentService::new(state.pool.clone());

    let students = state
        .cache
        .remember(&list_key(resource::STUDENTS, &filter), || service.list(&filter, page))
        .await?;
    Ok(ApiResponse::success(students))
}

/// GET /students/:id
pub async fn get(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Student> {
    let service = StudentService::new(state.pool.clone());
    let student = state
        .cache
        .remember(&item_key(resource::STUDENTS, id), || service.get(id))
        .await?;
    ensure_visible(&auth, &student)?;
    Ok(ApiResponse::success(student))
}

/// POST /students
pub async fn create(
    State(state): State<AppState>,
    _staff: StaffUser,
    JsonBody(input): JsonBody<CreateStudent>,
) -> ApiResult<Student> {
    input.validate()?;
    if let Some(teacher_id) = input.teacher_id {
        require_teacher(&state, teacher_id).await?;
    }

    let student = StudentService::new(state.pool.clone()).create(input).await?;
    state.cache.invalidate(DEPENDENTS).await;
    Ok(ApiResponse::created(student))
}

/// PATCH /students/:id - `teacher_id: null` unassigns the teacher
pub async fn update(
    State(state): State<AppState>,
    _staff: StaffUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(patch): JsonBody<UpdateStudent>,
) -> ApiResult<Student> {
    patch.validate()?;
    if let Some(Some(teacher_id)) = patch.teacher_id {
        require_teacher(&state, teacher_id).await?;
    }

    let student = StudentService::new(state.pool.clone()).update(id, patch).await?;
    state.cache.invalidate(DEPENDENTS).await;
    Ok(ApiResponse::success(student))
}

/// DELETE /students/:id - refused with 400 while classes still reference the student
pub async fn delete(
    State(state): State<AppState>,
    _staff: StaffUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    StudentService::new(state.pool.clone()).delete(id).await?;
    state.cache.invalidate(DEPENDENTS).await;
    Ok(ApiResponse::<()>::no_content())
}
