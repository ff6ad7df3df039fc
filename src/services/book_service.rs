use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::book::{Book, BookFilter, CreateBook, UpdateBook};
use crate::database::models::clean;
use crate::database::pagination::{like_pattern, Paged, Pagination};
use crate::database::DatabaseError;

#[derive(Clone)]
pub struct BookService {
    pool: PgPool,
}

impl BookService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &BookFilter, page: Pagination) -> Result<Paged<Book>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM books");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY title ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<Book>().fetch_all(&self.pool).await?;

        Ok(page.page_of(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Book, DatabaseError> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Book {} not found", id)))
    }

    pub async fn create(&self, input: CreateBook) -> Result<Book, DatabaseError> {
        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (id, title, level, description, file_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(input.title.trim())
        .bind(clean(input.level))
        .bind(clean(input.description))
        .bind(clean(input.file_url))
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    pub async fn update(&self, id: Uuid, patch: UpdateBook) -> Result<Book, DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE books SET updated_at = now()");
        if let Some(title) = patch.title {
            query.push(", title = ").push_bind(title.trim().to_string());
        }
        if let Some(level) = patch.level {
            query.push(", level = ").push_bind(clean(Some(level)));
        }
        if let Some(description) = patch.description {
            query.push(", description = ").push_bind(clean(Some(description)));
        }
        if let Some(file_url) = patch.file_url {
            query.push(", file_url = ").push_bind(clean(Some(file_url)));
        }
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Book {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    query.push(" WHERE TRUE");
    if let Some(level) = filter.level.as_deref().filter(|l| !l.trim().is_empty()) {
        query.push(" AND level = ").push_bind(level.trim().to_string());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        query.push(" AND title ILIKE ").push_bind(like_pattern(search));
    }
}
