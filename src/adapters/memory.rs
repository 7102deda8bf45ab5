use crate::adapters::{DeleteManyOutcome, MessageStore};
use crate::domain::message::{Message, NewMessage};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// In-process message store for local runs and tests. Nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryMessageStore {
    messages: Arc<DashMap<Uuid, Message>>,
}

impl MemoryMessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn put(&self, message: NewMessage) -> Result<Uuid> {
        let id = Uuid::now_v7();
        self.messages.insert(id, message.into_message(id));
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Message> {
        self.messages.get(&id).map(|entry| entry.value().clone()).ok_or(AppError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.messages.remove(&id).map(|_| ()).ok_or(AppError::NotFound)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> DeleteManyOutcome {
        let deleted = ids.iter().filter(|id| self.messages.remove(*id).is_some()).count();
        DeleteManyOutcome { deleted: deleted as u64, error: None }
    }

    async fn update_expiry(&self, id: Uuid, expire_at: OffsetDateTime) -> Result<()> {
        let mut entry = self.messages.get_mut(&id).ok_or(AppError::NotFound)?;
        entry.expire_at = expire_at;
        Ok(())
    }

    async fn query_by_recipient(&self, to: &str, limit: i64) -> Result<Vec<Message>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let mut matches: Vec<Message> =
            self.messages.iter().filter(|entry| entry.to == to).map(|entry| entry.value().clone()).collect();

        matches.sort_by(|a, b| b.received_at.cmp(&a.received_at).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn query_expired(&self, now: OffsetDateTime) -> Result<Vec<Uuid>> {
        Ok(self.messages.iter().filter(|entry| entry.is_expired_at(now)).map(|entry| *entry.key()).collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
