use crate::adapters::MessageStore;
use crate::domain::message::NewMessage;
use crate::error::Result;
use crate::services::retention_service::RetentionService;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    ingested: Counter<u64>,
    message_size: Histogram<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("spamme-server");
        Self {
            ingested: meter
                .u64_counter("spamme_messages_ingested_total")
                .with_description("Total inbound messages, by outcome")
                .build(),
            message_size: meter
                .u64_histogram("spamme_message_size_bytes")
                .with_description("Size of inbound raw messages")
                .build(),
        }
    }
}

/// Write side: stores inbound mail with its initial deadline.
#[derive(Clone, Debug)]
pub struct IngestService {
    store: Arc<dyn MessageStore>,
    retention: RetentionService,
    metrics: Metrics,
}

impl IngestService {
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>, retention: RetentionService) -> Self {
        Self { store, retention, metrics: Metrics::new() }
    }

    /// Stores `raw` for `recipient` as received at `now`.
    ///
    /// # Errors
    /// Returns `AppError::StoreUnavailable` if the store fails. Callers at the
    /// mail boundary log this and move on; there is no retry.
    #[tracing::instrument(err, skip(self, raw), fields(size = raw.len(), id = tracing::field::Empty))]
    pub async fn ingest(&self, recipient: &str, raw: Vec<u8>, now: OffsetDateTime) -> Result<Uuid> {
        let size = raw.len() as u64;
        let message = NewMessage {
            to: recipient.to_string(),
            body: raw,
            received_at: now,
            expire_at: self.retention.on_create(now),
        };

        match self.store.put(message).await {
            Ok(id) => {
                tracing::Span::current().record("id", tracing::field::display(id));
                tracing::debug!("Message stored");
                self.metrics.ingested.add(1, &[KeyValue::new("status", "success")]);
                self.metrics.message_size.record(size, &[]);
                Ok(id)
            }
            Err(e) => {
                self.metrics.ingested.add(1, &[KeyValue::new("status", "failure")]);
                Err(e)
            }
        }
    }
}
