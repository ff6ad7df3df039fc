use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::class::Class;
use crate::database::DatabaseError;
use crate::types::{ApplicationStatus, ClassStatus, PayoutStatus, Role, StudentStatus};

pub const UPCOMING_LIMIT: i64 = 10;

/// Back-office totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffDashboard {
    pub students_by_status: BTreeMap<String, i64>,
    pub teachers: i64,
    pub classes_this_week: i64,
    pub pending_payouts: i64,
    pub pending_applications: i64,
}

/// A teacher's own overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherDashboard {
    pub upcoming_classes: Vec<Class>,
    pub students: i64,
    pub unread_messages: i64,
    pub unread_notifications: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Dashboard {
    Staff(StaffDashboard),
    Teacher(TeacherDashboard),
}

/// Monday 00:00 UTC of the week containing `now`, and the following Monday
pub fn week_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_from_monday = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date_naive() - Duration::days(days_from_monday);
    let start = monday.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(7))
}

#[derive(Clone)]
pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn staff(&self) -> Result<StaffDashboard, DatabaseError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM students GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        let mut students_by_status: BTreeMap<String, i64> =
            StudentStatus::ALL.iter().map(|s| (s.as_str().to_string(), 0)).collect();
        students_by_status.extend(rows);

        let teachers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(Role::Teacher.as_str())
            .fetch_one(&self.pool)
            .await?;

        let (week_start, week_end) = week_bounds(Utc::now());
        let classes_this_week: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM classes WHERE start_time >= $1 AND start_time < $2 AND status <> $3",
        )
        .bind(week_start)
        .bind(week_end)
        .bind(ClassStatus::Cancelled.as_str())
        .fetch_one(&self.pool)
        .await?;

        let pending_payouts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payouts WHERE status = $1")
            .bind(PayoutStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;

        let pending_applications: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM teacher_applications WHERE status = $1")
                .bind(ApplicationStatus::Pending.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(StaffDashboard {
            students_by_status,
            teachers,
            classes_this_week,
            pending_payouts,
            pending_applications,
        })
    }

    pub async fn teacher(&self, teacher_id: Uuid) -> Result<TeacherDashboard, DatabaseError> {
        let upcoming_classes = sqlx::query_as::<_, Class>(
            "SELECT * FROM classes WHERE teacher_id = $1 AND status = $2 AND start_time >= now() \
             ORDER BY start_time ASC LIMIT $3",
        )
        .bind(teacher_id)
        .bind(ClassStatus::Scheduled.as_str())
        .bind(UPCOMING_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let students: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE teacher_id = $1")
            .bind(teacher_id)
            .fetch_one(&self.pool)
            .await?;

        let unread_messages: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND NOT read")
                .bind(teacher_id)
                .fetch_one(&self.pool)
                .await?;

        let unread_notifications: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT read")
                .bind(teacher_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(TeacherDashboard {
            upcoming_classes,
            students,
            unread_messages,
            unread_notifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn week_starts_on_monday() {
        // Thursday
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 15, 30, 0).unwrap();
        let (start, end) = week_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap());

        let monday = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        assert_eq!(week_bounds(monday).0, monday);
    }

    #[test]
    fn dashboard_is_tagged_by_view() {
        let json = serde_json::to_value(Dashboard::Teacher(TeacherDashboard {
            upcoming_classes: vec![],
            students: 3,
            unread_messages: 1,
            unread_notifications: 0,
        }))
        .unwrap();
        assert_eq!(json["view"], "teacher");
        assert_eq!(json["students"], 3);
    }
}
