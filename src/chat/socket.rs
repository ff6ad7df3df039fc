// chat/socket.rs - GET /ws handler

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use axum_extra::extract::CookieJar;
use futures::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use super::{ClientEvent, ServerEvent};
use crate::auth::TokenKind;
use crate::cache::resource;
use crate::database::models::message::{Message, SendMessage};
use crate::error::ApiError;
use crate::middleware::{extract_token, AuthUser};
use crate::services::{MessageService, UserService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SocketParams {
    pub token: Option<String>,
}

/// Upgrades to a chat socket authenticated by cookie, Bearer header or `?token=`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(params): Query<SocketParams>,
) -> Result<Response, ApiError> {
    let token = match params.token.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => extract_token(&jar, &headers).map_err(ApiError::unauthorized)?,
    };
    let claims = state
        .tokens
        .decode(&token, TokenKind::Access)
        .map_err(|_| ApiError::unauthorized("Authentication invalid"))?;
    let user = AuthUser::from(claims);

    tracing::info!(user_id = %user.id, "Chat socket connected");
    Ok(ws.on_upgrade(move |socket| run_session(socket, state, user)))
}

async fn run_session(socket: WebSocket, state: AppState, user: AuthUser) {
    let mut room = state.chat.subscribe(user.id);
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Some(reply) = handle_frame(&state, &user, &text).await {
                            if send_event(&mut sink, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(user_id = %user.id, error = %e, "Chat socket error");
                        break;
                    }
                }
            }
            event = room.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(user_id = %user.id, skipped, "Chat listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    drop(room);
    state.chat.release(user.id);
    tracing::info!(user_id = %user.id, "Chat socket closed");
}

async fn send_event<S>(sink: &mut S, event: &ServerEvent) -> Result<(), ()>
where
    S: Sink<WsMessage> + Unpin,
{
    let text = serde_json::to_string(event).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize chat event");
    })?;
    sink.send(WsMessage::Text(text)).await.map_err(|_| ())
}

/// Handles one client frame; returns a reply meant only for this socket
async fn handle_frame(state: &AppState, user: &AuthUser, text: &str) -> Option<ServerEvent> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => return Some(ServerEvent::error(format!("Unrecognized event: {}", e))),
    };

    match event {
        // The socket already listens on the caller's own room
        ClientEvent::JoinRoom { user_id } if user_id == user.id => None,
        ClientEvent::JoinRoom { .. } => Some(ServerEvent::error("You can only join your own room")),
        ClientEvent::SendMessage { receiver_id, content } => {
            match relay(state, user, SendMessage { receiver_id, content }).await {
                Ok(_) => None,
                Err(e) => Some(ServerEvent::error(e.message())),
            }
        }
    }
}

/// Validates, stores and fans out a message; shared by REST and the socket
pub async fn relay(state: &AppState, sender: &AuthUser, input: SendMessage) -> Result<Message, ApiError> {
    input.validate()?;
    UserService::new(state.pool.clone()).get(input.receiver_id).await?;

    let message = MessageService::new(state.pool.clone())
        .send(sender.id, input.receiver_id, &input.content)
        .await?;

    state.cache.invalidate(&[resource::MESSAGES, resource::DASHBOARD]).await;
    state.chat.deliver(&message);
    Ok(message)
}
