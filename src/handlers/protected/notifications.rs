// handlers/protected/notifications.rs - /api/v1/notification handlers

use axum::extract::State;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cache::{list_key, resource};
use crate::database::models::notification::{Audience, CreateNotification, Notification, NotificationFilter};
use crate::database::pagination::{Paged, Pagination};
use crate::middleware::{AnyUser, ApiResponse, ApiResult, JsonBody, PathParam, QueryParams, StaffUser};
use crate::services::{NotificationService, UserService};
use crate::state::AppState;

const DEPENDENTS: &[&str] = &[resource::NOTIFICATIONS, resource::DASHBOARD];

/// GET /notification - the caller's own notifications; `?unread=true` filters
pub async fn list(
    State(state): State<AppState>,
    auth: AnyUser,
    QueryParams(filter): QueryParams<NotificationFilter>,
) -> ApiResult<Paged<Notification>> {
    let page = Pagination::new(filter.page, filter.limit);
    let service = NotificationService::new(state.pool.clone());
    let key = list_key(resource::NOTIFICATIONS, &json!({ "user": auth.id, "filter": &filter }));

    let notifications = state
        .cache
        .remember(&key, || service.list_for(auth.id, &filter, page))
        .await?;
    Ok(ApiResponse::success(notifications))
}

/// POST /notification - to one user, or to every active user of a role
pub async fn create(
    State(state): State<AppState>,
    auth: StaffUser,
    JsonBody(input): JsonBody<CreateNotification>,
) -> ApiResult<Value> {
    let audience = input.validate()?;
    let users = UserService::new(state.pool.clone());
    let recipients = match audience {
        Audience::User(user_id) => vec![users.get(user_id).await?.id],
        Audience::Role(role) => users.active_ids_with_role(role).await?,
    };

    let sent = NotificationService::new(state.pool.clone())
        .create_many(&recipients, &input.title, &input.body)
        .await?;
    state.cache.invalidate(DEPENDENTS).await;

    tracing::info!(by = %auth.id, recipients = sent, "Sent notification");
    Ok(ApiResponse::created(json!({ "sent": sent })))
}

/// PATCH /notification/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Notification> {
    let notification = NotificationService::new(state.pool.clone())
        .mark_read(auth.id, id)
        .await?;
    state.cache.invalidate(DEPENDENTS).await;
    Ok(ApiResponse::success(notification))
}

/// PATCH /notification/read-all
pub async fn mark_all_read(State(state): State<AppState>, auth: AnyUser) -> ApiResult<Value> {
    let updated = NotificationService::new(state.pool.clone())
        .mark_all_read(auth.id)
        .await?;
    state.cache.invalidate(DEPENDENTS).await;
    Ok(ApiResponse::success(json!({ "updated": updated })))
}

/// DELETE /notification/:id
pub async fn delete(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    NotificationService::new(state.pool.clone())
        .delete(auth.id, id)
        .await?;
    state.cache.invalidate(DEPENDENTS).await;
    Ok(ApiResponse::<()>::no_content())
}
