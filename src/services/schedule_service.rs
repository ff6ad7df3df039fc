use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::schedule::{CreateSchedule, Schedule, ScheduleFilter};
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;

#[derive(Clone)]
pub struct ScheduleService {
    pool: PgPool,
}

impl ScheduleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &ScheduleFilter, page: Pagination) -> Result<Paged<Schedule>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM schedules");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM schedules");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY day_of_week, start_time LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<Schedule>().fetch_all(&self.pool).await?;

        Ok(page.page_of(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Schedule, DatabaseError> {
        sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Schedule {} not found", id)))
    }

    pub async fn create(&self, teacher_id: Uuid, input: &CreateSchedule) -> Result<Schedule, DatabaseError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            "INSERT INTO schedules (id, teacher_id, day_of_week, start_time, end_time) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(teacher_id)
        .bind(input.day_of_week)
        .bind(input.start_time)
        .bind(input.end_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(schedule)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Schedule {} not found", id)));
        }
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ScheduleFilter) {
    query.push(" WHERE TRUE");
    if let Some(teacher_id) = filter.teacher_id {
        query.push(" AND teacher_id = ").push_bind(teacher_id);
    }
    if let Some(day) = filter.day_of_week {
        query.push(" AND day_of_week = ").push_bind(day);
    }
}
