// handlers/protected/book_assign.rs - /api/v1/book-assign handlers

use axum::extract::State;
use uuid::Uuid;

use super::{own_scope, require_teacher};
use crate::cache::{list_key, resource};
use crate::database::models::book_assign::{BookAssignment, BookAssignmentFilter, CreateBookAssignment};
use crate::database::models::clean;
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::notify;
use crate::middleware::{AnyUser, ApiResponse, ApiResult, JsonBody, PathParam, QueryParams};
use crate::services::{BookAssignService, StudentService};
use crate::state::AppState;

/// GET /book-assign
pub async fn list(
    State(state): State<AppState>,
    auth: AnyUser,
    QueryParams(mut filter): QueryParams<BookAssignmentFilter>,
) -> ApiResult<Paged<BookAssignment>> {
    filter.teacher_id = own_scope(&auth, filter.teacher_id);
    let page = Pagination::new(filter.page, filter.limit);
    let service = BookAssignService::new(state.pool.clone());

    let assignments = state
        .cache
        .remember(&list_key(resource::BOOK_ASSIGN, &filter), || service.list(&filter, page))
        .await?;
    Ok(ApiResponse::success(assignments))
}

/// POST /book-assign - teachers assign to their own students. Staff may name
/// the teacher, otherwise the student's current teacher is used.
pub async fn create(
    State(state): State<AppState>,
    auth: AnyUser,
    JsonBody(input): JsonBody<CreateBookAssignment>,
) -> ApiResult<BookAssignment> {
    let student = match StudentService::new(state.pool.clone()).get(input.student_id).await {
        Ok(student) => student,
        Err(DatabaseError::NotFound(_)) => {
            return Err(ApiError::bad_request(format!("student_id {} does not exist", input.student_id)))
        }
        Err(e) => return Err(e.into()),
    };

    let teacher_id = if auth.is_staff() {
        let teacher_id = input
            .teacher_id
            .or(student.teacher_id)
            .ok_or_else(|| ApiError::bad_request("teacher_id is required for a student without a teacher"))?;
        require_teacher(&state, teacher_id).await?;
        teacher_id
    } else if student.teacher_id == Some(auth.id) {
        auth.id
    } else {
        return Err(ApiError::forbidden("You can only assign books to your own students"));
    };

    let assignment = BookAssignService::new(state.pool.clone())
        .create(input.book_id, student.id, teacher_id, clean(input.note))
        .await?;
    state
        .cache
        .invalidate(&[resource::BOOK_ASSIGN, resource::DASHBOARD])
        .await;

    notify(
        &state,
        teacher_id,
        "Book assigned",
        format!("\"{}\" was assigned to {}", assignment.book_title, assignment.student_name),
    )
    .await;
    Ok(ApiResponse::created(assignment))
}

/// DELETE /book-assign/:id
pub async fn delete(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    let service = BookAssignService::new(state.pool.clone());
    let assignment = service.get(id).await?;
    auth.ensure_self_or_staff(assignment.teacher_id)?;

    service.delete(id).await?;
    state
        .cache
        .invalidate(&[resource::BOOK_ASSIGN, resource::DASHBOARD])
        .await;
    Ok(ApiResponse::<()>::no_content())
}
