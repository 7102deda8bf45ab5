use crate::domain::message::{Message, NewMessage};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod database;
pub mod memory;

/// Result of a best-effort bulk delete: how many rows went away, and the first
/// failure encountered if any chunk could not be deleted.
#[derive(Debug, Default)]
pub struct DeleteManyOutcome {
    pub deleted: u64,
    pub error: Option<AppError>,
}

#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug {
    /// Persists a new message under a freshly generated id.
    async fn put(&self, message: NewMessage) -> Result<Uuid>;

    async fn get(&self, id: Uuid) -> Result<Message>;

    /// # Errors
    /// Returns `AppError::NotFound` if the id is unknown or already deleted.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Ids that no longer exist are skipped, not reported.
    async fn delete_many(&self, ids: &[Uuid]) -> DeleteManyOutcome;

    async fn update_expiry(&self, id: Uuid, expire_at: OffsetDateTime) -> Result<()>;

    /// Messages for an exact recipient, newest first, ties broken by id ascending.
    async fn query_by_recipient(&self, to: &str, limit: i64) -> Result<Vec<Message>>;

    /// Ids whose deadline is at or before `now`. Bodies are not loaded.
    async fn query_expired(&self, now: OffsetDateTime) -> Result<Vec<Uuid>>;

    async fn ping(&self) -> Result<()>;
}
