use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::clean;
use crate::database::models::payout::{CreatePayout, Payout, PayoutFilter, UpdatePayout};
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;
use crate::types::PayoutStatus;

#[derive(Clone)]
pub struct PayoutService {
    pool: PgPool,
}

impl PayoutService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &PayoutFilter, page: Pagination) -> Result<Paged<Payout>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM payouts");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM payouts");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY period_end DESC, created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<Payout>().fetch_all(&self.pool).await?;

        Ok(page.page_of(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Payout, DatabaseError> {
        sqlx::query_as::<_, Payout>("SELECT * FROM payouts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Payout {} not found", id)))
    }

    pub async fn create(&self, input: CreatePayout) -> Result<Payout, DatabaseError> {
        let currency = input.currency();
        let payout = sqlx::query_as::<_, Payout>(
            "INSERT INTO payouts \
             (id, teacher_id, amount, currency, period_start, period_end, classes_count, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(input.teacher_id)
        .bind(input.amount)
        .bind(currency)
        .bind(input.period_start)
        .bind(input.period_end)
        .bind(input.classes_count.unwrap_or(0))
        .bind(clean(input.note))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(payout_id = %payout.id, teacher_id = %payout.teacher_id, amount = %payout.amount, "Created payout");
        Ok(payout)
    }

    /// Moving to `paid` stamps `paid_at`; leaving it clears the stamp
    pub async fn update(&self, id: Uuid, patch: UpdatePayout) -> Result<Payout, DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE payouts SET updated_at = now()");
        if let Some(amount) = patch.amount {
            query.push(", amount = ").push_bind(amount);
        }
        if let Some(currency) = patch.currency {
            query.push(", currency = ").push_bind(currency);
        }
        if let Some(count) = patch.classes_count {
            query.push(", classes_count = ").push_bind(count);
        }
        if let Some(note) = patch.note {
            query.push(", note = ").push_bind(clean(Some(note)));
        }
        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status.as_str());
            if status == PayoutStatus::Paid {
                query.push(", paid_at = COALESCE(paid_at, now())");
            } else {
                query.push(", paid_at = NULL");
            }
        }
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query
            .build_query_as::<Payout>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Payout {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM payouts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Payout {} not found", id)));
        }
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &PayoutFilter) {
    query.push(" WHERE TRUE");
    if let Some(teacher_id) = filter.teacher_id {
        query.push(" AND teacher_id = ").push_bind(teacher_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
}
