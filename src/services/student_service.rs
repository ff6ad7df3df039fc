use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::clean;
use crate::database::models::student::{CreateStudent, Student, StudentFilter, UpdateStudent};
use crate::database::pagination::{like_pattern, Paged, Pagination};
use crate::database::DatabaseError;
use crate::types::StudentStatus;

#[derive(Clone)]
pub struct StudentService {
    pool: PgPool,
}

impl StudentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &StudentFilter, page: Pagination) -> Result<Paged<Student>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM students");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM students");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<Student>().fetch_all(&self.pool).await?;

        Ok(page.page_of(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Student, DatabaseError> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Student {} not found", id)))
    }

    pub async fn create(&self, input: CreateStudent) -> Result<Student, DatabaseError> {
        let student = sqlx::query_as::<_, Student>(
            "INSERT INTO students \
             (id, name, english_name, email, phone, age, level, manager, platform, status, teacher_id, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(clean(input.english_name))
        .bind(clean(input.email))
        .bind(clean(input.phone))
        .bind(input.age)
        .bind(clean(input.level))
        .bind(input.manager.as_str())
        .bind(input.platform.as_str())
        .bind(input.status.unwrap_or(StudentStatus::Active).as_str())
        .bind(input.teacher_id)
        .bind(clean(input.notes))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(student_id = %student.id, "Created student");
        Ok(student)
    }

    pub async fn update(&self, id: Uuid, patch: UpdateStudent) -> Result<Student, DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE students SET updated_at = now()");
        if let Some(name) = patch.name {
            query.push(", name = ").push_bind(name.trim().to_string());
        }
        if let Some(english_name) = patch.english_name {
            query.push(", english_name = ").push_bind(clean(Some(english_name)));
        }
        if let Some(email) = patch.email {
            query.push(", email = ").push_bind(clean(Some(email)));
        }
        if let Some(phone) = patch.phone {
            query.push(", phone = ").push_bind(clean(Some(phone)));
        }
        if let Some(age) = patch.age {
            query.push(", age = ").push_bind(age);
        }
        if let Some(level) = patch.level {
            query.push(", level = ").push_bind(clean(Some(level)));
        }
        if let Some(manager) = patch.manager {
            query.push(", manager = ").push_bind(manager.as_str());
        }
        if let Some(platform) = patch.platform {
            query.push(", platform = ").push_bind(platform.as_str());
        }
        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status.as_str());
        }
        if let Some(teacher_id) = patch.teacher_id {
            query.push(", teacher_id = ").push_bind(teacher_id);
        }
        if let Some(notes) = patch.notes {
            query.push(", notes = ").push_bind(clean(Some(notes)));
        }
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query
            .build_query_as::<Student>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Student {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Student {} not found", id)));
        }
        tracing::info!(student_id = %id, "Deleted student");
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &StudentFilter) {
    query.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(manager) = filter.manager {
        query.push(" AND manager = ").push_bind(manager.as_str());
    }
    if let Some(teacher_id) = filter.teacher_id {
        query.push(" AND teacher_id = ").push_bind(teacher_id);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR english_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
