use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::looks_like_email;
use crate::error::{ApiError, FieldErrors};
use crate::types::ApplicationStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeacherApplication {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub experience: Option<String>,
    pub message: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitApplication {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub experience: Option<String>,
    pub message: Option<String>,
}

impl SubmitApplication {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", Some(&self.name));
        errors.check("email", looks_like_email(&self.email), "Must be a valid email address");
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewApplication {
    pub status: ApplicationStatus,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
