use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};

/// A weekly availability slot
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSchedule {
    /// Defaults to the caller for teachers
    pub teacher_id: Option<Uuid>,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl CreateSchedule {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.check("day_of_week", (0..=6).contains(&self.day_of_week), "Must be between 0 and 6");
        errors.check("end_time", self.start_time < self.end_time, "Must be after start_time");
        errors.into_result()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScheduleFilter {
    pub teacher_id: Option<Uuid>,
    pub day_of_week: Option<i16>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_must_be_ordered_and_on_a_weekday() {
        let input: CreateSchedule = serde_json::from_str(
            r#"{"day_of_week": 9, "start_time": "10:00:00", "end_time": "09:00:00"}"#,
        )
        .unwrap();
        let body = input.validate().unwrap_err().to_json();
        assert!(body["field_errors"].get("day_of_week").is_some());
        assert!(body["field_errors"].get("end_time").is_some());

        let ok: CreateSchedule = serde_json::from_str(
            r#"{"day_of_week": 2, "start_time": "09:00:00", "end_time": "10:30:00"}"#,
        )
        .unwrap();
        assert!(ok.validate().is_ok());
    }
}
