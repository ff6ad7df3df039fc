use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::class::{Class, ClassFilter, CreateClass, MakeupRequest, UpdateClass};
use crate::database::models::clean;
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;
use crate::types::{ClassKind, ClassStatus};

#[derive(Clone)]
pub struct ClassService {
    pool: PgPool,
}

impl ClassService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &ClassFilter, page: Pagination) -> Result<Paged<Class>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM classes");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM classes");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY start_time ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<Class>().fetch_all(&self.pool).await?;

        Ok(page.page_of(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Class, DatabaseError> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Class {} not found", id)))
    }

    /// Inserts a validated class; fields foreign to its kind are dropped first
    pub async fn create(&self, input: CreateClass) -> Result<Class, DatabaseError> {
        let input = input.normalized();
        let class = sqlx::query_as::<_, Class>(
            "INSERT INTO classes \
             (id, kind, teacher_id, student_id, title, start_time, duration_minutes, platform, \
              meeting_link, recurrence_days, recurrence_until, original_class_id, makeup_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(input.kind.as_str())
        .bind(input.teacher_id)
        .bind(input.student_id)
        .bind(input.title.trim())
        .bind(input.start_time)
        .bind(input.duration_minutes)
        .bind(input.platform.as_str())
        .bind(input.meeting_link)
        .bind(input.recurrence_days)
        .bind(input.recurrence_until)
        .bind(input.original_class_id)
        .bind(input.makeup_reason)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(class_id = %class.id, kind = %class.kind, teacher_id = %class.teacher_id, "Created class");
        Ok(class)
    }

    /// Reassigning the teacher carries over to the class's attendance and media rows
    pub async fn update(&self, id: Uuid, patch: UpdateClass) -> Result<Class, DatabaseError> {
        let reassigned = patch.teacher_id;
        let mut query = QueryBuilder::<Postgres>::new("UPDATE classes SET updated_at = now()");
        if let Some(teacher_id) = patch.teacher_id {
            query.push(", teacher_id = ").push_bind(teacher_id);
        }
        if let Some(student_id) = patch.student_id {
            query.push(", student_id = ").push_bind(student_id);
        }
        if let Some(title) = patch.title {
            query.push(", title = ").push_bind(title.trim().to_string());
        }
        if let Some(start_time) = patch.start_time {
            query.push(", start_time = ").push_bind(start_time);
        }
        if let Some(minutes) = patch.duration_minutes {
            query.push(", duration_minutes = ").push_bind(minutes);
        }
        if let Some(platform) = patch.platform {
            query.push(", platform = ").push_bind(platform.as_str());
        }
        if let Some(link) = patch.meeting_link {
            query.push(", meeting_link = ").push_bind(clean(Some(link)));
        }
        // Recurrence and makeup fields only apply to their own kind
        if let Some(mut days) = patch.recurrence_days {
            days.sort_unstable();
            days.dedup();
            query
                .push(", recurrence_days = CASE WHEN kind = 'recurring' THEN ")
                .push_bind(days)
                .push(" ELSE recurrence_days END");
        }
        if let Some(until) = patch.recurrence_until {
            query
                .push(", recurrence_until = CASE WHEN kind = 'recurring' THEN ")
                .push_bind(until)
                .push(" ELSE recurrence_until END");
        }
        if let Some(reason) = clean(patch.makeup_reason) {
            query
                .push(", makeup_reason = CASE WHEN kind = 'makeup' THEN ")
                .push_bind(reason)
                .push(" ELSE makeup_reason END");
        }
        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status.as_str());
        }
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let mut tx = self.pool.begin().await?;
        let class = query
            .build_query_as::<Class>()
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Class {} not found", id)))?;

        if let Some(teacher_id) = reassigned {
            for table in ["attendance", "recordings", "screenshots"] {
                let sql = format!(
                    "UPDATE {} SET teacher_id = $1, updated_at = now() WHERE class_id = $2 AND teacher_id <> $1",
                    table
                );
                sqlx::query(&sql).bind(teacher_id).bind(id).execute(&mut *tx).await?;
            }
            tracing::info!(class_id = %id, teacher_id = %teacher_id, "Reassigned class");
        }

        tx.commit().await?;
        Ok(class)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Class {} not found", id)));
        }
        tracing::info!(class_id = %id, "Deleted class");
        Ok(())
    }

    /// Schedules a makeup for `original_id` in one transaction.
    ///
    /// The original is flipped to `missed` only while it is still
    /// `scheduled`; the makeup copies its teacher, student, title and platform.
    pub async fn create_makeup(&self, original_id: Uuid, request: MakeupRequest) -> Result<Class, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let original = sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1 FOR UPDATE")
            .bind(original_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Class {} not found", original_id)))?;

        if original.status == ClassStatus::Scheduled {
            sqlx::query("UPDATE classes SET status = $2, updated_at = now() WHERE id = $1")
                .bind(original.id)
                .bind(ClassStatus::Missed.as_str())
                .execute(&mut *tx)
                .await?;
        }

        let makeup = sqlx::query_as::<_, Class>(
            "INSERT INTO classes \
             (id, kind, teacher_id, student_id, title, start_time, duration_minutes, platform, \
              meeting_link, original_class_id, makeup_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(ClassKind::Makeup.as_str())
        .bind(original.teacher_id)
        .bind(original.student_id)
        .bind(&original.title)
        .bind(request.start_time)
        .bind(request.duration_minutes.unwrap_or(original.duration_minutes))
        .bind(original.platform.as_str())
        .bind(clean(request.meeting_link).or(original.meeting_link))
        .bind(original.id)
        .bind(request.reason.trim())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(class_id = %makeup.id, original_class_id = %original.id, "Scheduled makeup class");
        Ok(makeup)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ClassFilter) {
    query.push(" WHERE TRUE");
    if let Some(teacher_id) = filter.teacher_id {
        query.push(" AND teacher_id = ").push_bind(teacher_id);
    }
    if let Some(student_id) = filter.student_id {
        query.push(" AND student_id = ").push_bind(student_id);
    }
    if let Some(kind) = filter.kind {
        query.push(" AND kind = ").push_bind(kind.as_str());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.from {
        query.push(" AND start_time >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        query.push(" AND start_time < ").push_bind(to);
    }
}
