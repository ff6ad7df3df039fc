use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{looks_like_email, normalize_email};
use crate::error::{ApiError, FieldErrors};
use crate::types::{Role, UserStatus};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Full `users` row, including the password hash
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[sqlx(try_from = "String")]
    pub status: UserStatus,
    pub phone: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user; never carries the hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub phone: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            phone: user.phone,
            hourly_rate: user.hourly_rate,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub hourly_rate: Option<Decimal>,
}

impl RegisterUser {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", Some(&self.name));
        errors.check("email", looks_like_email(&self.email), "Must be a valid email address");
        errors.check(
            "password",
            self.password.chars().count() >= MIN_PASSWORD_LEN,
            "Must be at least 8 characters",
        );
        if let Some(rate) = self.hourly_rate {
            errors.check("hourly_rate", rate >= Decimal::ZERO, "Must not be negative");
        }
        errors.into_result()
    }

    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub status: Option<UserStatus>,
}

impl UpdateUser {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            errors.require_text("name", Some(name));
        }
        if let Some(email) = &self.email {
            errors.check("email", looks_like_email(email), "Must be a valid email address");
        }
        if let Some(rate) = self.hourly_rate {
            errors.check("hourly_rate", rate >= Decimal::ZERO, "Must not be negative");
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePassword {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_text("current_password", Some(&self.current_password));
        errors.check(
            "new_password",
            self.new_password.chars().count() >= MIN_PASSWORD_LEN,
            "Must be at least 8 characters",
        );
        errors.into_result()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserFilter {
    pub status: Option<UserStatus>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register() -> RegisterUser {
        RegisterUser {
            name: "Jane".to_string(),
            email: "Jane@Academy.kr".to_string(),
            password: "longenough".to_string(),
            role: Role::Teacher,
            phone: None,
            hourly_rate: Some(Decimal::new(2500, 2)),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(register().validate().is_ok());
        assert_eq!(register().normalized_email(), "jane@academy.kr");
    }

    #[test]
    fn short_password_and_bad_email_fail() {
        let mut input = register();
        input.password = "short".to_string();
        input.email = "nope".to_string();
        let body = input.validate().unwrap_err().to_json();
        assert!(body["field_errors"].get("password").is_some());
        assert!(body["field_errors"].get("email").is_some());
    }

    #[test]
    fn negative_rate_fails() {
        let update = UpdateUser { hourly_rate: Some(Decimal::new(-1, 0)), ..Default::default() };
        assert!(update.validate().is_err());
    }

    #[test]
    fn profile_drops_the_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Jane".into(),
            email: "jane@academy.kr".into(),
            password_hash: "$2b$04$hash".into(),
            role: Role::Teacher,
            status: UserStatus::Active,
            phone: None,
            hourly_rate: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "teacher");
    }
}
