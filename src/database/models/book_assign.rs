use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Assignment row joined with the book title and student name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookAssignment {
    pub id: Uuid,
    pub book_id: Uuid,
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub note: Option<String>,
    pub book_title: String,
    pub student_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookAssignment {
    pub book_id: Uuid,
    pub student_id: Uuid,
    /// Defaults to the student's teacher, then the caller
    pub teacher_id: Option<Uuid>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BookAssignmentFilter {
    pub book_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
