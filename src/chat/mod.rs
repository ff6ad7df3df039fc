//! Real-time message relay.
//!
//! Every connected user listens on a room named after their own id. A message
//! is persisted first, then fanned out to the receiver's room and echoed to the
//! sender's room so all of the sender's open tabs stay in sync.

mod socket;

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub use socket::{relay, ws_handler};

use crate::database::models::message::Message;

/// Events buffered per room before slow listeners start lagging
pub const ROOM_CAPACITY: usize = 64;

/// Frames sent by clients: `{"event": "...", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "joinRoom")]
    JoinRoom {
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
    #[serde(rename = "sendMessage")]
    SendMessage {
        #[serde(rename = "receiverId")]
        receiver_id: Uuid,
        content: String,
    },
}

/// Frames pushed to clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "receiveMessage")]
    ReceiveMessage(Message),
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error { message: message.into() }
    }
}

/// Room registry keyed by user id
#[derive(Clone, Default)]
pub struct ChatHub {
    rooms: Arc<DashMap<Uuid, broadcast::Sender<ServerEvent>>>,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins `user_id`'s room, creating it on first use
    pub fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<ServerEvent> {
        self.rooms
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Sends to a room; returns how many listeners received it
    pub fn publish(&self, user_id: Uuid, event: ServerEvent) -> usize {
        match self.rooms.get(&user_id) {
            Some(room) => room.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Relays a stored message to both participants
    pub fn deliver(&self, message: &Message) {
        let delivered = self.publish(message.receiver_id, ServerEvent::ReceiveMessage(message.clone()));
        if message.sender_id != message.receiver_id {
            self.publish(message.sender_id, ServerEvent::ReceiveMessage(message.clone()));
        }
        tracing::debug!(message_id = %message.id, receiver_id = %message.receiver_id, delivered, "Relayed message");
    }

    /// Drops the room once its last listener is gone
    pub fn release(&self, user_id: Uuid) {
        self.rooms.remove_if(&user_id, |_, room| room.receiver_count() == 0);
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.rooms
            .get(&user_id)
            .map(|room| room.receiver_count() > 0)
            .unwrap_or(false)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn message(sender_id: Uuid, receiver_id: Uuid) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: "Class moved to 7pm".into(),
            read: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn parses_client_frames() {
        let id = Uuid::new_v4();
        let join: ClientEvent = serde_json::from_value(json!({"event": "joinRoom", "data": {"userId": id}})).unwrap();
        assert_eq!(join, ClientEvent::JoinRoom { user_id: id });

        let send: ClientEvent = serde_json::from_value(
            json!({"event": "sendMessage", "data": {"receiverId": id, "content": "hi"}}),
        )
        .unwrap();
        assert_eq!(send, ClientEvent::SendMessage { receiver_id: id, content: "hi".into() });

        assert!(serde_json::from_value::<ClientEvent>(json!({"event": "leaveRoom", "data": {}})).is_err());
    }

    #[test]
    fn server_frames_use_event_names() {
        let json = serde_json::to_value(ServerEvent::error("nope")).unwrap();
        assert_eq!(json, json!({"event": "error", "data": {"message": "nope"}}));
    }

    #[tokio::test]
    async fn delivers_to_receiver_and_echoes_to_sender() {
        let hub = ChatHub::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut alice_rx = hub.subscribe(alice);
        let mut bob_rx = hub.subscribe(bob);

        let sent = message(alice, bob);
        hub.deliver(&sent);

        for rx in [&mut alice_rx, &mut bob_rx] {
            match rx.recv().await.unwrap() {
                ServerEvent::ReceiveMessage(m) => assert_eq!(m.id, sent.id),
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn offline_receiver_is_not_an_error() {
        let hub = ChatHub::new();
        assert_eq!(hub.publish(Uuid::new_v4(), ServerEvent::error("x")), 0);
    }

    #[test]
    fn empty_rooms_are_released() {
        let hub = ChatHub::new();
        let user = Uuid::new_v4();
        let first = hub.subscribe(user);
        let second = hub.subscribe(user);
        assert_eq!(hub.room_count(), 1);

        drop(first);
        hub.release(user);
        assert!(hub.is_online(user));

        drop(second);
        hub.release(user);
        assert_eq!(hub.room_count(), 0);
        assert!(!hub.is_online(user));
    }
}
