use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{double_option, looks_like_email};
use crate::error::{ApiError, FieldErrors};
use crate::types::{Manager, Platform, StudentStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub english_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub level: Option<String>,
    #[sqlx(try_from = "String")]
    pub manager: Manager,
    #[sqlx(try_from = "String")]
    pub platform: Platform,
    #[sqlx(try_from = "String")]
    pub status: StudentStatus,
    pub teacher_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStudent {
    pub name: String,
    pub english_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub level: Option<String>,
    pub manager: Manager,
    pub platform: Platform,
    pub status: Option<StudentStatus>,
    pub teacher_id: Option<Uuid>,
    pub notes: Option<String>,
}

fn check_common(errors: &mut FieldErrors, email: Option<&str>, age: Option<i32>) {
    if let Some(email) = email {
        errors.check("email", looks_like_email(email), "Must be a valid email address");
    }
    if let Some(age) = age {
        errors.check("age", (2..=120).contains(&age), "Must be between 2 and 120");
    }
}

impl CreateStudent {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", Some(&self.name));
        check_common(&mut errors, self.email.as_deref(), self.age);
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStudent {
    pub name: Option<String>,
    pub english_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub level: Option<String>,
    pub manager: Option<Manager>,
    pub platform: Option<Platform>,
    pub status: Option<StudentStatus>,
    /// `null` unassigns the teacher
    #[serde(default, deserialize_with = "double_option")]
    pub teacher_id: Option<Option<Uuid>>,
    pub notes: Option<String>,
}

impl UpdateStudent {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.require_text("name", Some(name));
        }
        check_common(&mut errors, self.email.as_deref(), self.age);
        errors.into_result()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StudentFilter {
    pub status: Option<StudentStatus>,
    pub manager: Option<Manager>,
    pub teacher_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_fields_fail_to_parse() {
        let result = serde_json::from_str::<CreateStudent>(r#"{"name": "Min-jun"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn validates_age_and_blank_name() {
        let input: CreateStudent = serde_json::from_str(
            r#"{"name": " ", "manager": "km", "platform": "zoom", "age": 1}"#,
        )
        .unwrap();
        let body = input.validate().unwrap_err().to_json();
        assert!(body["field_errors"].get("name").is_some());
        assert!(body["field_errors"].get("age").is_some());
    }

    #[test]
    fn update_accepts_teacher_unassignment() {
        let patch: UpdateStudent = serde_json::from_str(r#"{"teacher_id": null}"#).unwrap();
        assert_eq!(patch.teacher_id, Some(None));
        assert!(patch.validate().is_ok());
    }
}
