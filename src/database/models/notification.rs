use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};
use crate::types::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff broadcast: exactly one of `user_id` or `role`
#[derive(Debug, Deserialize)]
pub struct CreateNotification {
    pub user_id: Option<Uuid>,
    pub role: Option<Role>,
    pub title: String,
    pub body: String,
}

/// Resolved audience of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    User(Uuid),
    Role(Role),
}

impl CreateNotification {
    pub fn validate(&self) -> Result<Audience, ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_text("title", Some(&self.title));
        errors.require_text("body", Some(&self.body));
        let audience = match (self.user_id, self.role) {
            (Some(id), None) => Some(Audience::User(id)),
            (None, Some(role)) => Some(Audience::Role(role)),
            _ => {
                errors.add("user_id", "Provide either user_id or role");
                None
            }
        };
        errors.into_result()?;
        audience.ok_or_else(|| ApiError::bad_request("Provide either user_id or role"))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NotificationFilter {
    pub unread: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(user_id: Option<Uuid>, role: Option<Role>) -> CreateNotification {
        CreateNotification { user_id, role, title: "Heads up".into(), body: "Schedule changed".into() }
    }

    #[test]
    fn audience_is_exactly_one_target() {
        let id = Uuid::new_v4();
        assert_eq!(input(Some(id), None).validate().unwrap(), Audience::User(id));
        assert_eq!(input(None, Some(Role::Teacher)).validate().unwrap(), Audience::Role(Role::Teacher));
        assert!(input(None, None).validate().is_err());
        assert!(input(Some(id), Some(Role::Admin)).validate().is_err());
    }
}
