// handlers/protected/media.rs - /api/v1/recording and /api/v1/screenshot handlers
//
// Both resources share one set of handlers; the route picks the kind through
// the `MediaSlot` type parameter, e.g. `get(media::list::<Recordings>)`.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use uuid::Uuid;

use super::own_scope;
use crate::cache::{item_key, list_key, resource};
use crate::database::models::media::{MediaFile, MediaFilter, MediaView};
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{AnyUser, ApiResponse, ApiResult, PathParam, QueryParams};
use crate::services::{ClassService, MediaService};
use crate::state::AppState;
use crate::types::MediaKind;

/// Binds a media kind to its cache prefix
pub trait MediaSlot: Send + Sync + 'static {
    const KIND: MediaKind;
    const RESOURCE: &'static str;
}

pub struct Recordings;

impl MediaSlot for Recordings {
    const KIND: MediaKind = MediaKind::Recording;
    const RESOURCE: &'static str = resource::RECORDINGS;
}

pub struct Screenshots;

impl MediaSlot for Screenshots {
    const KIND: MediaKind = MediaKind::Screenshot;
    const RESOURCE: &'static str = resource::SCREENSHOTS;
}

struct UploadForm {
    class_id: Uuid,
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut class_id = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("class_id") => {
                let text = field.text().await?;
                let id = text
                    .trim()
                    .parse::<Uuid>()
                    .map_err(|_| ApiError::bad_request("class_id must be a UUID"))?;
                class_id = Some(id);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                file = Some((file_name, content_type, bytes));
            }
            _ => {}
        }
    }

    let class_id = class_id.ok_or_else(|| ApiError::bad_request("class_id is required"))?;
    let (file_name, content_type, bytes) = file.ok_or_else(|| ApiError::bad_request("file is required"))?;
    Ok(UploadForm { class_id, file_name, content_type, bytes })
}

fn views(page: Paged<MediaFile>) -> Paged<MediaView> {
    Paged {
        items: page.items.into_iter().map(MediaView::from).collect(),
        page: page.page,
        limit: page.limit,
        total: page.total,
    }
}

/// GET /{recording,screenshot}
pub async fn list<M: MediaSlot>(
    State(state): State<AppState>,
    auth: AnyUser,
    QueryParams(mut filter): QueryParams<MediaFilter>,
) -> ApiResult<Paged<MediaView>> {
    filter.teacher_id = own_scope(&auth, filter.teacher_id);
    let page = Pagination::new(filter.page, filter.limit);
    let service = MediaService::new(state.pool.clone(), M::KIND);

    let files = state
        .cache
        .remember(&list_key(M::RESOURCE, &filter), || service.list(&filter, page))
        .await?;
    Ok(ApiResponse::success(views(files)))
}

/// GET /{recording,screenshot}/:id
pub async fn get<M: MediaSlot>(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<MediaView> {
    let service = MediaService::new(state.pool.clone(), M::KIND);
    let file = state
        .cache
        .remember(&item_key(M::RESOURCE, id), || service.get(id))
        .await?;
    auth.ensure_self_or_staff(file.teacher_id)?;
    Ok(ApiResponse::success(MediaView::from(file)))
}

/// POST /{recording,screenshot} - multipart with `class_id` and `file`
pub async fn upload<M: MediaSlot>(
    State(state): State<AppState>,
    auth: AnyUser,
    multipart: Multipart,
) -> ApiResult<MediaView> {
    let form = read_form(multipart).await?;
    state.uploads.check(M::KIND, &form.content_type, form.bytes.len())?;

    let class = match ClassService::new(state.pool.clone()).get(form.class_id).await {
        Ok(class) => class,
        Err(DatabaseError::NotFound(_)) => {
            return Err(ApiError::bad_request(format!("class_id {} does not exist", form.class_id)))
        }
        Err(e) => return Err(e.into()),
    };
    auth.ensure_self_or_staff(class.teacher_id)?;

    let stored = state
        .uploads
        .save(M::KIND, &form.file_name, &form.content_type, form.bytes)
        .await?;

    let created = MediaService::new(state.pool.clone(), M::KIND)
        .create(class.id, class.teacher_id, &stored)
        .await;
    let file = match created {
        Ok(file) => file,
        Err(e) => {
            if let Err(cleanup) = state.uploads.remove(&stored.stored_path).await {
                tracing::warn!(path = %stored.stored_path, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    state.cache.invalidate(&[M::RESOURCE]).await;
    Ok(ApiResponse::created(MediaView::from(file)))
}

/// DELETE /{recording,screenshot}/:id - the row goes first, then the file
pub async fn delete<M: MediaSlot>(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    let service = MediaService::new(state.pool.clone(), M::KIND);
    let file = service.get(id).await?;
    auth.ensure_self_or_staff(file.teacher_id)?;

    let removed = service.delete(id).await?;
    if let Err(e) = state.uploads.remove(&removed.stored_path).await {
        tracing::warn!(path = %removed.stored_path, error = %e, "Failed to remove media file");
    }

    state.cache.invalidate(&[M::RESOURCE]).await;
    Ok(ApiResponse::<()>::no_content())
}
