use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::media::{MediaFile, MediaFilter};
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;
use crate::types::MediaKind;
use crate::uploads::StoredFile;

/// Recordings and screenshots; `kind` picks the table
#[derive(Clone)]
pub struct MediaService {
    pool: PgPool,
    kind: MediaKind,
}

impl MediaService {
    pub fn new(pool: PgPool, kind: MediaKind) -> Self {
        Self { pool, kind }
    }

    fn not_found(&self, id: Uuid) -> DatabaseError {
        DatabaseError::NotFound(format!("{} {} not found", self.kind, id))
    }

    pub async fn list(&self, filter: &MediaFilter, page: Pagination) -> Result<Paged<MediaFile>, DatabaseError> {
        let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", self.kind.table()));
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {}", self.kind.table()));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = query.build_query_as::<MediaFile>().fetch_all(&self.pool).await?;

        Ok(page.page_of(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<MediaFile, DatabaseError> {
        sqlx::query_as::<_, MediaFile>(&format!("SELECT * FROM {} WHERE id = $1", self.kind.table()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    pub async fn create(&self, class_id: Uuid, teacher_id: Uuid, file: &StoredFile) -> Result<MediaFile, DatabaseError> {
        let sql = format!(
            "INSERT INTO {} \
             (id, class_id, teacher_id, original_name, stored_path, content_type, size_bytes, drive_file_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
            self.kind.table()
        );
        let media = sqlx::query_as::<_, MediaFile>(&sql)
            .bind(Uuid::new_v4())
            .bind(class_id)
            .bind(teacher_id)
            .bind(&file.original_name)
            .bind(&file.stored_path)
            .bind(&file.content_type)
            .bind(file.size_bytes)
            .bind(&file.drive_file_id)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(kind = %self.kind, media_id = %media.id, class_id = %class_id, size = media.size_bytes, "Stored upload");
        Ok(media)
    }

    /// Stored paths of every file attached to a class
    pub async fn stored_paths_for_class(&self, class_id: Uuid) -> Result<Vec<String>, DatabaseError> {
        let paths = sqlx::query_scalar::<_, String>(&format!(
            "SELECT stored_path FROM {} WHERE class_id = $1",
            self.kind.table()
        ))
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(paths)
    }

    /// Removes the row and returns it so the caller can drop the file
    pub async fn delete(&self, id: Uuid) -> Result<MediaFile, DatabaseError> {
        sqlx::query_as::<_, MediaFile>(&format!("DELETE FROM {} WHERE id = $1 RETURNING *", self.kind.table()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| self.not_found(id))
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &MediaFilter) {
    query.push(" WHERE TRUE");
    if let Some(class_id) = filter.class_id {
        query.push(" AND class_id = ").push_bind(class_id);
    }
    if let Some(teacher_id) = filter.teacher_id {
        query.push(" AND teacher_id = ").push_bind(teacher_id);
    }
}
