use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};

pub const MAX_MESSAGE_LEN: usize = 4000;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub receiver_id: Uuid,
    pub content: String,
}

impl SendMessage {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_text("content", Some(&self.content));
        errors.check(
            "content",
            self.content.chars().count() <= MAX_MESSAGE_LEN,
            "Must be at most 4000 characters",
        );
        errors.into_result()
    }
}

/// Latest message per counterpart, with the unread count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub user_id: Uuid,
    pub user_name: String,
    pub last_message: String,
    pub last_at: DateTime<Utc>,
    pub unread: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ThreadQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_bounds() {
        let blank = SendMessage { receiver_id: Uuid::new_v4(), content: "  ".into() };
        assert!(blank.validate().is_err());
        let long = SendMessage { receiver_id: Uuid::new_v4(), content: "a".repeat(MAX_MESSAGE_LEN + 1) };
        assert!(long.validate().is_err());
        let ok = SendMessage { receiver_id: Uuid::new_v4(), content: "See you at 7".into() };
        assert!(ok.validate().is_ok());
    }
}
