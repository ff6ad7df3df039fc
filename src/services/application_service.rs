use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::application::{ApplicationFilter, SubmitApplication, TeacherApplication};
use crate::database::models::{clean, normalize_email};
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;
use crate::types::ApplicationStatus;

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
}

impl ApplicationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(&self, input: SubmitApplication) -> Result<TeacherApplication, DatabaseError> {
        let application = sqlx::query_as::<_, TeacherApplication>(
            "INSERT INTO teacher_applications (id, name, email, phone, experience, message) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(normalize_email(&input.email))
        .bind(clean(input.phone))
        .bind(clean(input.experience))
        .bind(clean(input.message))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(application_id = %application.id, "Received teacher application");
        Ok(application)
    }

    pub async fn list(
        &self,
        filter: &ApplicationFilter,
        page: Pagination,
    ) -> Result<Paged<TeacherApplication>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM teacher_applications");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM teacher_applications");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<TeacherApplication>().fetch_all(&self.pool).await?;

        Ok(page.page_of(items, total))
    }

    pub async fn review(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        reviewer_id: Uuid,
    ) -> Result<TeacherApplication, DatabaseError> {
        sqlx::query_as::<_, TeacherApplication>(
            "UPDATE teacher_applications SET status = $2, reviewed_by = $3, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(reviewer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Application {} not found", id)))
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ApplicationFilter) {
    query.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
}
