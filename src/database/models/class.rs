use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::clean;
use crate::error::{ApiError, FieldErrors};
use crate::types::{ClassKind, ClassStatus, Platform};

pub const MAX_DURATION_MINUTES: i32 = 480;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Class {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub kind: ClassKind,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    #[sqlx(try_from = "String")]
    pub platform: Platform,
    pub meeting_link: Option<String>,
    pub recurrence_days: Option<Vec<i16>>,
    pub recurrence_until: Option<NaiveDate>,
    pub original_class_id: Option<Uuid>,
    pub makeup_reason: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ClassStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClass {
    pub kind: ClassKind,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub platform: Platform,
    pub meeting_link: Option<String>,
    pub recurrence_days: Option<Vec<i16>>,
    pub recurrence_until: Option<NaiveDate>,
    pub original_class_id: Option<Uuid>,
    pub makeup_reason: Option<String>,
}

fn check_duration(errors: &mut FieldErrors, minutes: i32) {
    errors.check(
        "duration_minutes",
        (1..=MAX_DURATION_MINUTES).contains(&minutes),
        "Must be between 1 and 480 minutes",
    );
}

fn check_days(errors: &mut FieldErrors, days: &[i16]) {
    errors.check("recurrence_days", !days.is_empty(), "At least one weekday is required");
    errors.check(
        "recurrence_days",
        days.iter().all(|d| (0..=6).contains(d)),
        "Weekdays are numbered 0 (Sunday) to 6",
    );
}

impl CreateClass {
    /// Field requirements depend on `kind`
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_text("title", Some(&self.title));
        check_duration(&mut errors, self.duration_minutes);

        match self.kind {
            ClassKind::Single => {}
            ClassKind::Recurring => {
                match &self.recurrence_days {
                    Some(days) => check_days(&mut errors, days),
                    None => errors.add("recurrence_days", "Required for recurring classes"),
                }
                match self.recurrence_until {
                    Some(until) => errors.check(
                        "recurrence_until",
                        until >= self.start_time.date_naive(),
                        "Must not be before the first class",
                    ),
                    None => errors.add("recurrence_until", "Required for recurring classes"),
                }
            }
            ClassKind::Makeup => {
                if self.original_class_id.is_none() {
                    errors.add("original_class_id", "Required for makeup classes");
                }
                errors.require_text("makeup_reason", self.makeup_reason.as_deref());
            }
        }
        errors.into_result()
    }

    /// Drop fields that do not apply to the class kind
    pub fn normalized(mut self) -> Self {
        if self.kind != ClassKind::Recurring {
            self.recurrence_days = None;
            self.recurrence_until = None;
        } else if let Some(days) = self.recurrence_days.as_mut() {
            days.sort_unstable();
            days.dedup();
        }
        if self.kind != ClassKind::Makeup {
            self.original_class_id = None;
            self.makeup_reason = None;
        }
        self.meeting_link = clean(self.meeting_link);
        self.makeup_reason = clean(self.makeup_reason);
        self
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClass {
    pub teacher_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub platform: Option<Platform>,
    pub meeting_link: Option<String>,
    pub recurrence_days: Option<Vec<i16>>,
    pub recurrence_until: Option<NaiveDate>,
    pub makeup_reason: Option<String>,
    pub status: Option<ClassStatus>,
}

impl UpdateClass {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &self.title {
            errors.require_text("title", Some(title));
        }
        if let Some(minutes) = self.duration_minutes {
            check_duration(&mut errors, minutes);
        }
        if let Some(days) = &self.recurrence_days {
            check_days(&mut errors, days);
        }
        errors.into_result()
    }

    /// Teachers may only move their own classes between statuses
    pub fn is_status_only(&self) -> bool {
        self.teacher_id.is_none()
            && self.student_id.is_none()
            && self.title.is_none()
            && self.start_time.is_none()
            && self.duration_minutes.is_none()
            && self.platform.is_none()
            && self.meeting_link.is_none()
            && self.recurrence_days.is_none()
            && self.recurrence_until.is_none()
            && self.makeup_reason.is_none()
    }
}

/// Reschedule a missed class
#[derive(Debug, Deserialize)]
pub struct MakeupRequest {
    pub start_time: DateTime<Utc>,
    pub reason: String,
    pub duration_minutes: Option<i32>,
    pub meeting_link: Option<String>,
}

impl MakeupRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_text("reason", Some(&self.reason));
        if let Some(minutes) = self.duration_minutes {
            check_duration(&mut errors, minutes);
        }
        errors.into_result()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClassFilter {
    pub teacher_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub kind: Option<ClassKind>,
    pub status: Option<ClassStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base(kind: &str) -> serde_json::Value {
        json!({
            "kind": kind,
            "teacher_id": Uuid::new_v4(),
            "student_id": Uuid::new_v4(),
            "title": "Phonics",
            "start_time": "2026-03-02T09:00:00Z",
            "duration_minutes": 50,
            "platform": "zoom"
        })
    }

    fn parse(value: serde_json::Value) -> CreateClass {
        serde_json::from_value(value).unwrap()
    }

    fn field_errors(input: &CreateClass) -> serde_json::Value {
        input.validate().unwrap_err().to_json()["field_errors"].clone()
    }

    #[test]
    fn single_class_needs_no_extras() {
        assert!(parse(base("single")).validate().is_ok());
    }

    #[test]
    fn recurring_class_requires_days_and_end_date() {
        let errors = field_errors(&parse(base("recurring")));
        assert!(errors.get("recurrence_days").is_some());
        assert!(errors.get("recurrence_until").is_some());

        let mut value = base("recurring");
        value["recurrence_days"] = json!([1, 3, 7]);
        value["recurrence_until"] = json!("2026-01-01");
        let errors = field_errors(&parse(value));
        assert_eq!(errors["recurrence_days"], "Weekdays are numbered 0 (Sunday) to 6");
        assert_eq!(errors["recurrence_until"], "Must not be before the first class");

        let mut value = base("recurring");
        value["recurrence_days"] = json!([3, 1, 3]);
        value["recurrence_until"] = json!("2026-06-30");
        let input = parse(value);
        assert!(input.validate().is_ok());
        assert_eq!(input.normalized().recurrence_days, Some(vec![1, 3]));
    }

    #[test]
    fn makeup_class_requires_original_and_reason() {
        let errors = field_errors(&parse(base("makeup")));
        assert!(errors.get("original_class_id").is_some());
        assert!(errors.get("makeup_reason").is_some());
    }

    #[test]
    fn normalization_strips_foreign_fields() {
        let mut value = base("single");
        value["recurrence_days"] = json!([1]);
        value["makeup_reason"] = json!("sick");
        let input = parse(value).normalized();
        assert!(input.recurrence_days.is_none());
        assert!(input.makeup_reason.is_none());
    }

    #[test]
    fn duration_is_bounded() {
        let mut value = base("single");
        value["duration_minutes"] = json!(0);
        assert!(field_errors(&parse(value)).get("duration_minutes").is_some());
    }

    #[test]
    fn status_only_updates() {
        let patch: UpdateClass = serde_json::from_value(json!({"status": "completed"})).unwrap();
        assert!(patch.is_status_only());
        let patch: UpdateClass = serde_json::from_value(json!({"status": "completed", "title": "x"})).unwrap();
        assert!(!patch.is_status_only());
    }
}
