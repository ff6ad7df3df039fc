use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::attendance::{Attendance, AttendanceFilter, CreateAttendance, UpdateAttendance};
use crate::database::models::class::Class;
use crate::database::models::clean;
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;

#[derive(Clone)]
pub struct AttendanceService {
    pool: PgPool,
}

impl AttendanceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &AttendanceFilter, page: Pagination) -> Result<Paged<Attendance>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM attendance");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM attendance");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY marked_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<Attendance>().fetch_all(&self.pool).await?;

        Ok(page.page_of(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Attendance, DatabaseError> {
        sqlx::query_as::<_, Attendance>("SELECT * FROM attendance WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Attendance {} not found", id)))
    }

    /// Marks attendance for the class's student; a second mark is a unique violation
    pub async fn create(&self, class: &Class, input: CreateAttendance) -> Result<Attendance, DatabaseError> {
        let attendance = sqlx::query_as::<_, Attendance>(
            "INSERT INTO attendance (id, class_id, student_id, teacher_id, status, note) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(class.id)
        .bind(class.student_id)
        .bind(class.teacher_id)
        .bind(input.status.as_str())
        .bind(clean(input.note))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(attendance_id = %attendance.id, class_id = %class.id, status = %attendance.status, "Marked attendance");
        Ok(attendance)
    }

    pub async fn update(&self, id: Uuid, patch: UpdateAttendance) -> Result<Attendance, DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE attendance SET updated_at = now()");
        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status.as_str()).push(", marked_at = now()");
        }
        if let Some(note) = patch.note {
            query.push(", note = ").push_bind(clean(Some(note)));
        }
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query
            .build_query_as::<Attendance>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Attendance {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Attendance {} not found", id)));
        }
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &AttendanceFilter) {
    query.push(" WHERE TRUE");
    if let Some(class_id) = filter.class_id {
        query.push(" AND class_id = ").push_bind(class_id);
    }
    if let Some(student_id) = filter.student_id {
        query.push(" AND student_id = ").push_bind(student_id);
    }
    if let Some(teacher_id) = filter.teacher_id {
        query.push(" AND teacher_id = ").push_bind(teacher_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
}
