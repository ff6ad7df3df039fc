use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::book_assign::{BookAssignment, BookAssignmentFilter};
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;

const SELECT_VIEW: &str = "SELECT a.id, a.book_id, a.student_id, a.teacher_id, a.note, \
     b.title AS book_title, s.name AS student_name, a.created_at, a.updated_at \
     FROM book_assignments a \
     JOIN books b ON b.id = a.book_id \
     JOIN students s ON s.id = a.student_id";

#[derive(Clone)]
pub struct BookAssignService {
    pool: PgPool,
}

impl BookAssignService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filter: &BookAssignmentFilter,
        page: Pagination,
    ) -> Result<Paged<BookAssignment>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM book_assignments a");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(SELECT_VIEW);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY a.created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<BookAssignment>().fetch_all(&self.pool).await?;

        Ok(page.page_of(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<BookAssignment, DatabaseError> {
        sqlx::query_as::<_, BookAssignment>(&format!("{} WHERE a.id = $1", SELECT_VIEW))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Book assignment {} not found", id)))
    }

    /// Assigning the same book to a student twice is a unique violation
    pub async fn create(
        &self,
        book_id: Uuid,
        student_id: Uuid,
        teacher_id: Uuid,
        note: Option<String>,
    ) -> Result<BookAssignment, DatabaseError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO book_assignments (id, book_id, student_id, teacher_id, note) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(book_id)
        .bind(student_id)
        .bind(teacher_id)
        .bind(note)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(assignment_id = %id, book_id = %book_id, student_id = %student_id, "Assigned book");
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM book_assignments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Book assignment {} not found", id)));
        }
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &BookAssignmentFilter) {
    query.push(" WHERE TRUE");
    if let Some(book_id) = filter.book_id {
        query.push(" AND a.book_id = ").push_bind(book_id);
    }
    if let Some(student_id) = filter.student_id {
        query.push(" AND a.student_id = ").push_bind(student_id);
    }
    if let Some(teacher_id) = filter.teacher_id {
        query.push(" AND a.teacher_id = ").push_bind(teacher_id);
    }
}
