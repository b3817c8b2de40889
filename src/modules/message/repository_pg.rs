use std::collections::HashSet;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::schema::ordered_pair,
        message::{model::InsertMessage, repository::MessageRepository, schema::MessageEntity},
    },
};

#[derive(Clone)]
pub struct MessageRepositoryPg {
    pool: sqlx::PgPool,
}

impl MessageRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Flips every unread message from `friend_id` to `user_id`, returning the flipped ids.
    async fn mark_read(
        conn: &mut PgConnection,
        user_id: &Uuid,
        friend_id: &Uuid,
    ) -> Result<HashSet<Uuid>, error::SystemError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE messages
            SET read = TRUE
            WHERE sender_id = $1 AND receiver_id = $2 AND read = FALSE
            RETURNING id
            "#,
        )
        .bind(friend_id)
        .bind(user_id)
        .fetch_all(conn)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn recent_thread(
        conn: &mut PgConnection,
        user_id: &Uuid,
        friend_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        // has index on (LEAST, GREATEST, created_at DESC, id DESC)
        let (low, high) = ordered_pair(*user_id, *friend_id);

        let messages = sqlx::query_as::<_, MessageEntity>(
            r#"
            SELECT * FROM (
                SELECT *
                FROM messages
                WHERE LEAST(sender_id, receiver_id) = $1
                  AND GREATEST(sender_id, receiver_id) = $2
                ORDER BY created_at DESC, id DESC
                LIMIT $3
            ) recent
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(low)
        .bind(high)
        .bind(limit)
        .fetch_all(conn)
        .await?;

        Ok(messages)
    }
}

#[async_trait::async_trait]
impl MessageRepository for MessageRepositoryPg {
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError> {
        // now_v7 is monotonic within the process, so ids break created_at ties
        let message = sqlx::query_as::<_, MessageEntity>(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn find_thread_and_mark_read(
        &self,
        user_id: &Uuid,
        friend_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // Flip first: every flipped row is visible to the read below, and a
        // message committed in between is returned unread and left unread.
        let flipped = Self::mark_read(&mut tx, user_id, friend_id).await?;
        let mut messages = Self::recent_thread(&mut tx, user_id, friend_id, limit).await?;

        tx.commit().await?;

        for message in messages.iter_mut().filter(|m| flipped.contains(&m.id)) {
            message.read = false;
        }

        Ok(messages)
    }
}
