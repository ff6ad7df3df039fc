use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::message::{Conversation, Message};
use crate::database::pagination::{Paged, Pagination};
use crate::database::DatabaseError;

#[derive(Clone)]
pub struct MessageService {
    pool: PgPool,
}

impl MessageService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn send(&self, sender_id: Uuid, receiver_id: Uuid, content: &str) -> Result<Message, DatabaseError> {
        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, sender_id, receiver_id, content) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content.trim())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(message_id = %message.id, sender_id = %sender_id, receiver_id = %receiver_id, "Stored message");
        Ok(message)
    }

    /// Messages between two users, oldest first
    pub async fn thread(&self, user_id: Uuid, other_id: Uuid, page: Pagination) -> Result<Paged<Message>, DatabaseError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)",
        )
        .bind(user_id)
        .bind(other_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(other_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(page.page_of(items, total))
    }

    /// Marks everything `other_id` sent to `user_id` as read
    pub async fn mark_thread_read(&self, user_id: Uuid, other_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE messages SET read = TRUE, updated_at = now() \
             WHERE receiver_id = $1 AND sender_id = $2 AND NOT read",
        )
        .bind(user_id)
        .bind(other_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, DatabaseError> {
        let rows = sqlx::query_as::<_, Conversation>(
            "WITH pairs AS ( \
                 SELECT CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS other_id, \
                        content, created_at, (receiver_id = $1 AND NOT read) AS unread_flag \
                 FROM messages WHERE sender_id = $1 OR receiver_id = $1 \
             ), latest AS ( \
                 SELECT DISTINCT ON (other_id) other_id, content, created_at \
                 FROM pairs ORDER BY other_id, created_at DESC \
             ) \
             SELECT l.other_id AS user_id, u.name AS user_name, l.content AS last_message, \
                    l.created_at AS last_at, \
                    (SELECT COUNT(*) FROM pairs p WHERE p.other_id = l.other_id AND p.unread_flag) AS unread \
             FROM latest l JOIN users u ON u.id = l.other_id \
             ORDER BY l.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
