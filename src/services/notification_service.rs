use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::notification::{Notification, NotificationFilter};
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Notifications addressed to `user_id`, newest first
    pub async fn list_for(
        &self,
        user_id: Uuid,
        filter: &NotificationFilter,
        page: Pagination,
    ) -> Result<Paged<Notification>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM notifications");
        push_filters(&mut count, user_id, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM notifications");
        push_filters(&mut query, user_id, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<Notification>().fetch_all(&self.pool).await?;

        Ok(page.page_of(items, total))
    }

    pub async fn create(&self, user_id: Uuid, title: &str, body: &str) -> Result<Notification, DatabaseError> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, user_id, title, body) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title.trim())
        .bind(body.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    /// One row per recipient, inserted in a single statement
    pub async fn create_many(&self, user_ids: &[Uuid], title: &str, body: &str) -> Result<u64, DatabaseError> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let mut query = QueryBuilder::<Postgres>::new("INSERT INTO notifications (id, user_id, title, body) ");
        query.push_values(user_ids, |mut row, user_id| {
            row.push_bind(Uuid::new_v4())
                .push_bind(*user_id)
                .push_bind(title.trim().to_string())
                .push_bind(body.trim().to_string());
        });
        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Marks one of the user's notifications read; someone else's reads as missing
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification, DatabaseError> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET read = TRUE, updated_at = now() \
             WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Notification {} not found", id)))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE, updated_at = now() WHERE user_id = $1 AND NOT read",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Notification {} not found", id)));
        }
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filter: &NotificationFilter) {
    query.push(" WHERE user_id = ").push_bind(user_id);
    if let Some(unread) = filter.unread {
        query.push(" AND read = ").push_bind(!unread);
    }
}
