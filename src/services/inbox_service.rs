use crate::adapters::MessageStore;
use crate::domain::message::Message;
use crate::error::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Read side: turns a local part into an address and lists what arrived for it.
#[derive(Clone, Debug)]
pub struct InboxService {
    store: Arc<dyn MessageStore>,
    domain: String,
    limit: i64,
}

impl InboxService {
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>, domain: String, limit: i64) -> Self {
        Self { store, domain, limit }
    }

    /// Any local part is accepted verbatim; there is no validation.
    #[must_use]
    pub fn address_for(&self, local_part: &str) -> String {
        format!("{local_part}@{}", self.domain)
    }

    /// Up to the configured cap of messages for the address, newest first.
    /// An empty inbox is `Ok(vec![])`.
    ///
    /// # Errors
    /// Returns `AppError::StoreUnavailable` if the store fails.
    #[tracing::instrument(err(level = "warn"), skip(self), fields(count = tracing::field::Empty))]
    pub async fn list_inbox(&self, local_part: &str) -> Result<Vec<Message>> {
        let to = self.address_for(local_part);
        let messages = self.store.query_by_recipient(&to, self.limit).await?;
        tracing::Span::current().record("count", messages.len());
        Ok(messages)
    }

    /// # Errors
    /// Returns `AppError::NotFound` if the message does not exist.
    pub async fn get_message(&self, id: Uuid) -> Result<Message> {
        self.store.get(id).await
    }
}
