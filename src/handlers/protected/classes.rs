// handlers/protected/classes.rs - /api/v1/classes handlers

use axum::extract::State;
use uuid::Uuid;

use super::{own_scope, require_teacher};
use crate::cache::{item_key, list_key, resource};
use crate::database::models::class::{Class, ClassFilter, CreateClass, MakeupRequest, UpdateClass};
use crate::database::pagination::{Paged, Pagination};
use crate::error::ApiError;
use crate::handlers::notify;
use crate::middleware::{AnyUser, ApiResponse, ApiResult, JsonBody, PathParam, QueryParams, StaffUser};
use crate::services::{ClassService, MediaService};
use crate::state::AppState;
use crate::types::MediaKind;

const DEPENDENTS: &[&str] = &[resource::CLASSES, resource::DASHBOARD];

fn describe(class: &Class) -> String {
    format!(
        "{} ({}) on {} for {} minutes",
        class.title,
        class.kind,
        class.start_time.format("%Y-%m-%d %H:%M UTC"),
        class.duration_minutes
    )
}

/// Loads a class the caller may act on
async fn load_owned(state: &AppState, auth: &AnyUser, id: Uuid) -> Result<Class, ApiError> {
    let service = ClassService::new(state.pool.clone());
    let class = state
        .cache
        .remember(&item_key(resource::CLASSES, id), || service.get(id))
        .await?;
    auth.ensure_self_or_staff(class.teacher_id)?;
    Ok(class)
}

/// GET /classes - `from`/`to` bound `start_time`
pub async fn list(
    State(state): State<AppState>,
    auth: AnyUser,
    QueryParams(mut filter): QueryParams<ClassFilter>,
) -> ApiResult<Paged<Class>> {
    filter.teacher_id = own_scope(&auth, filter.teacher_id);
    let page = Pagination::new(filter.page, filter.limit);
    let service = ClassService::new(state.pool.clone());

    let classes = state
        .cache
        .remember(&list_key(resource::CLASSES, &filter), || service.list(&filter, page))
        .await?;
    Ok(ApiResponse::success(classes))
}

/// GET /classes/:id
pub async fn get(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Class> {
    let class = load_owned(&state, &auth, id).await?;
    Ok(ApiResponse::success(class))
}

/// POST /classes
pub async fn create(
    State(state): State<AppState>,
    _staff: StaffUser,
    JsonBody(input): JsonBody<CreateClass>,
) -> ApiResult<Class> {
    input.validate()?;
    require_teacher(&state, input.teacher_id).await?;

    let class = ClassService::new(state.pool.clone()).create(input).await?;
    state.cache.invalidate(DEPENDENTS).await;

    notify(&state, class.teacher_id, "New class scheduled", describe(&class)).await;
    Ok(ApiResponse::created(class))
}

/// PATCH /classes/:id - teachers may only change the status of their own classes
pub async fn update(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(patch): JsonBody<UpdateClass>,
) -> ApiResult<Class> {
    patch.validate()?;
    load_owned(&state, &auth, id).await?;

    if !auth.is_staff() && !patch.is_status_only() {
        return Err(ApiError::forbidden("Teachers can only update the class status"));
    }
    if let Some(teacher_id) = patch.teacher_id {
        require_teacher(&state, teacher_id).await?;
    }

    let reassigned = patch.teacher_id.is_some();
    let class = ClassService::new(state.pool.clone()).update(id, patch).await?;
    state.cache.invalidate(DEPENDENTS).await;
    if reassigned {
        state
            .cache
            .invalidate(&[resource::ATTENDANCE, resource::RECORDINGS, resource::SCREENSHOTS])
            .await;
    }
    Ok(ApiResponse::success(class))
}

/// DELETE /classes/:id - attendance and media rows cascade; the media files
/// are removed from disk afterwards
pub async fn delete(
    State(state): State<AppState>,
    _staff: StaffUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    let mut stored = Vec::new();
    for &kind in MediaKind::ALL {
        stored.extend(
            MediaService::new(state.pool.clone(), kind)
                .stored_paths_for_class(id)
                .await?,
        );
    }

    ClassService::new(state.pool.clone()).delete(id).await?;

    for path in &stored {
        if let Err(e) = state.uploads.remove(path).await {
            tracing::warn!(path = %path, error = %e, "Failed to remove class media file");
        }
    }

    state
        .cache
        .invalidate(&[
            resource::CLASSES,
            resource::ATTENDANCE,
            resource::RECORDINGS,
            resource::SCREENSHOTS,
            resource::DASHBOARD,
        ])
        .await;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /classes/:id/makeup - marks the original missed and schedules its makeup
pub async fn makeup(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(request): JsonBody<MakeupRequest>,
) -> ApiResult<Class> {
    request.validate()?;
    load_owned(&state, &auth, id).await?;

    let makeup = ClassService::new(state.pool.clone()).create_makeup(id, request).await?;
    state.cache.invalidate(DEPENDENTS).await;

    notify(&state, makeup.teacher_id, "Makeup class scheduled", describe(&makeup)).await;
    Ok(ApiResponse::created(makeup))
}
