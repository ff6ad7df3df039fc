use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::AttendanceStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub marked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Student and teacher are taken from the class
#[derive(Debug, Deserialize)]
pub struct CreateAttendance {
    pub class_id: Uuid,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAttendance {
    pub status: Option<AttendanceStatus>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AttendanceFilter {
    pub class_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub status: Option<AttendanceStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
