// handlers/protected/messages.rs - /api/v1/message handlers

use axum::extract::State;
use serde_json::json;
use uuid::Uuid;

use crate::cache::{list_key, resource};
use crate::chat;
use crate::database::models::message::{Conversation, Message, SendMessage, ThreadQuery};
use crate::database::pagination::{Paged, Pagination};
use crate::middleware::{AnyUser, ApiResponse, ApiResult, JsonBody, PathParam, QueryParams};
use crate::services::{MessageService, UserService};
use crate::state::AppState;

/// GET /message/conversations - one row per counterpart, newest first
pub async fn conversations(State(state): State<AppState>, auth: AnyUser) -> ApiResult<Vec<Conversation>> {
    let service = MessageService::new(state.pool.clone());
    let key = list_key(resource::MESSAGES, &json!({ "conversations": auth.id }));

    let conversations = state
        .cache
        .remember(&key, || service.conversations(auth.id))
        .await?;
    Ok(ApiResponse::success(conversations))
}

/// GET /message/:user_id - the thread with one user; their messages to the
/// caller are marked read first
pub async fn thread(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(other_id): PathParam<Uuid>,
    QueryParams(query): QueryParams<ThreadQuery>,
) -> ApiResult<Paged<Message>> {
    UserService::new(state.pool.clone()).get(other_id).await?;
    let service = MessageService::new(state.pool.clone());

    if service.mark_thread_read(auth.id, other_id).await? > 0 {
        state
            .cache
            .invalidate(&[resource::MESSAGES, resource::DASHBOARD])
            .await;
    }

    let page = Pagination::new(query.page, query.limit);
    let key = list_key(
        resource::MESSAGES,
        &json!({ "thread": [auth.id, other_id], "page": page }),
    );
    let messages = state
        .cache
        .remember(&key, || service.thread(auth.id, other_id, page))
        .await?;
    Ok(ApiResponse::success(messages))
}

/// POST /message - persisted and pushed to both users' chat rooms
pub async fn send(
    State(state): State<AppState>,
    auth: AnyUser,
    JsonBody(input): JsonBody<SendMessage>,
) -> ApiResult<Message> {
    let message = chat::relay(&state, &auth, input).await?;
    Ok(ApiResponse::created(message))
}
