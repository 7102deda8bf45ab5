use crate::adapters::database::DbPool;
use crate::adapters::database::records::MessageRecord;
use crate::adapters::{DeleteManyOutcome, MessageStore};
use crate::domain::message::{Message, NewMessage};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Postgres-backed message store.
#[derive(Clone, Debug)]
pub struct MessageRepository {
    pool: DbPool,
    delete_batch_size: usize,
}

impl MessageRepository {
    #[must_use]
    pub fn new(pool: DbPool, delete_batch_size: usize) -> Self {
        Self { pool, delete_batch_size: delete_batch_size.max(1) }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    /// Records a new message.
    ///
    /// # Errors
    /// Returns `AppError::StoreUnavailable` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, message), fields(to = %message.to, size = message.body.len()))]
    async fn put(&self, message: NewMessage) -> Result<Uuid> {
        let id = Uuid::now_v7();

        sqlx::query(
            r#"
            INSERT INTO messages (id, recipient, body, received_at, expire_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&message.to)
        .bind(&message.body)
        .bind(message.received_at)
        .bind(message.expire_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(&self, id: Uuid) -> Result<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, recipient, body, received_at, expire_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        record.map(Into::into).ok_or(AppError::NotFound)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Deletes in chunks, carrying on past a failed chunk.
    #[tracing::instrument(level = "debug", skip(self, ids), fields(count = ids.len()))]
    async fn delete_many(&self, ids: &[Uuid]) -> DeleteManyOutcome {
        let mut outcome = DeleteManyOutcome::default();

        for chunk in ids.chunks(self.delete_batch_size) {
            match sqlx::query("DELETE FROM messages WHERE id = ANY($1)").bind(chunk).execute(&self.pool).await {
                Ok(result) => outcome.deleted += result.rows_affected(),
                Err(e) => {
                    tracing::warn!(error = %e, chunk_size = chunk.len(), "Failed to delete message chunk");
                    if outcome.error.is_none() {
                        outcome.error = Some(AppError::StoreUnavailable(e));
                    }
                }
            }
        }

        outcome
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn update_expiry(&self, id: Uuid, expire_at: OffsetDateTime) -> Result<()> {
        let result = sqlx::query("UPDATE messages SET expire_at = $2 WHERE id = $1")
            .bind(id)
            .bind(expire_at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn query_by_recipient(&self, to: &str, limit: i64) -> Result<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, recipient, body, received_at, expire_at
            FROM messages
            WHERE recipient = $1
            ORDER BY received_at DESC, id ASC
            LIMIT $2
            "#,
        )
        .bind(to)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn query_expired(&self, now: OffsetDateTime) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM messages WHERE expire_at <= $1")
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
