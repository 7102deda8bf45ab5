use crate::adapters::MessageStore;
use crate::domain::message::{Message, RetentionPolicy};
use crate::error::Result;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    swept: Counter<u64>,
    sweep_errors: Counter<u64>,
    pinned: Counter<u64>,
    deleted: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("spamme-server");
        Self {
            swept: meter
                .u64_counter("spamme_messages_swept_total")
                .with_description("Total messages deleted by the expiry sweep")
                .build(),
            sweep_errors: meter
                .u64_counter("spamme_sweep_errors_total")
                .with_description("Total sweep runs that hit a store error")
                .build(),
            pinned: meter
                .u64_counter("spamme_messages_pinned_total")
                .with_description("Total pin requests")
                .build(),
            deleted: meter
                .u64_counter("spamme_messages_deleted_total")
                .with_description("Total manual delete requests")
                .build(),
        }
    }
}

/// Owns the time-to-live rules: the deadline a new message gets, pin, manual
/// delete, and the periodic sweep.
///
/// A pin can lose against a sweep that already listed the message as expired;
/// nothing serializes the two.
#[derive(Clone, Debug)]
pub struct RetentionService {
    store: Arc<dyn MessageStore>,
    policy: RetentionPolicy,
    metrics: Metrics,
}

impl RetentionService {
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>, policy: RetentionPolicy) -> Self {
        Self { store, policy, metrics: Metrics::new() }
    }

    /// Deadline for a message received at `now`.
    #[must_use]
    pub fn on_create(&self, now: OffsetDateTime) -> OffsetDateTime {
        self.policy.expire_at_from(now)
    }

    /// Restarts the message's clock from `now`. The new deadline replaces the
    /// old one, it is not added to it.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the message does not exist.
    /// Returns `AppError::StoreUnavailable` if the store fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn pin(&self, id: Uuid, now: OffsetDateTime) -> Result<Message> {
        let mut message = self.store.get(id).await?;
        let expire_at = self.policy.expire_at_from(now);
        self.store.update_expiry(id, expire_at).await?;

        self.metrics.pinned.add(1, &[]);
        tracing::info!(%expire_at, "Message pinned");

        message.expire_at = expire_at;
        Ok(message)
    }

    /// # Errors
    /// Returns `AppError::NotFound` if the message does not exist or was already deleted.
    /// Returns `AppError::StoreUnavailable` if the store fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn delete_now(&self, id: Uuid) -> Result<()> {
        self.store.delete(id).await?;
        self.metrics.deleted.add(1, &[]);
        tracing::info!("Message deleted");
        Ok(())
    }

    /// Deletes every message whose deadline is at or before `now`.
    ///
    /// Safe to run concurrently with itself: ids another sweep already removed
    /// are simply not counted. A partial bulk-delete failure is logged and the
    /// count of what did get deleted is still returned.
    ///
    /// # Errors
    /// Returns `AppError::StoreUnavailable` if the expired ids cannot be listed.
    #[tracing::instrument(err, skip(self), fields(expired = tracing::field::Empty, deleted = tracing::field::Empty))]
    pub async fn sweep(&self, now: OffsetDateTime) -> Result<u64> {
        let ids = match self.store.query_expired(now).await {
            Ok(ids) => ids,
            Err(e) => {
                self.metrics.sweep_errors.add(1, &[KeyValue::new("stage", "query")]);
                return Err(e);
            }
        };
        tracing::Span::current().record("expired", ids.len());

        if ids.is_empty() {
            return Ok(0);
        }

        let outcome = self.store.delete_many(&ids).await;
        if let Some(e) = outcome.error {
            tracing::error!(error = %e, deleted = outcome.deleted, "Sweep partially failed");
            self.metrics.sweep_errors.add(1, &[KeyValue::new("stage", "delete")]);
        }

        if outcome.deleted > 0 {
            tracing::info!(count = outcome.deleted, "Deleted expired messages");
            self.metrics.swept.add(outcome.deleted, &[]);
        }
        tracing::Span::current().record("deleted", outcome.deleted);

        Ok(outcome.deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DeleteManyOutcome;
    use crate::adapters::memory::MemoryMessageStore;
    use crate::domain::message::NewMessage;
    use crate::error::AppError;
    use async_trait::async_trait;
    use time::Duration;

    /// Memory store whose bulk delete gives up after the first id of each call.
    #[derive(Debug)]
    struct FlakyBulkDeleteStore {
        inner: MemoryMessageStore,
    }

    #[async_trait]
    impl MessageStore for FlakyBulkDeleteStore {
        async fn put(&self, message: NewMessage) -> Result<Uuid> {
            self.inner.put(message).await
        }

        async fn get(&self, id: Uuid) -> Result<Message> {
            self.inner.get(id).await
        }

        async fn delete(&self, id: Uuid) -> Result<()> {
            self.inner.delete(id).await
        }

        async fn delete_many(&self, ids: &[Uuid]) -> DeleteManyOutcome {
            let outcome = self.inner.delete_many(&ids[..ids.len().min(1)]).await;
            let error = (ids.len() > 1).then(|| AppError::StoreUnavailable(sqlx::Error::PoolTimedOut));
            DeleteManyOutcome { deleted: outcome.deleted, error }
        }

        async fn update_expiry(&self, id: Uuid, expire_at: OffsetDateTime) -> Result<()> {
            self.inner.update_expiry(id, expire_at).await
        }

        async fn query_by_recipient(&self, to: &str, limit: i64) -> Result<Vec<Message>> {
            self.inner.query_by_recipient(to, limit).await
        }

        async fn query_expired(&self, now: OffsetDateTime) -> Result<Vec<Uuid>> {
            self.inner.query_expired(now).await
        }

        async fn ping(&self) -> Result<()> {
            self.inner.ping().await
        }
    }

    fn service(store: &MemoryMessageStore) -> RetentionService {
        let policy = RetentionPolicy::new(Duration::hours(2)).unwrap();
        RetentionService::new(Arc::new(store.clone()), policy)
    }

    async fn seed(store: &MemoryMessageStore, svc: &RetentionService, at: OffsetDateTime) -> Uuid {
        store
            .put(NewMessage { to: "foo@x".into(), body: b"body".to_vec(), received_at: at, expire_at: svc.on_create(at) })
            .await
            .unwrap()
    }

    #[test]
    fn test_on_create_adds_ttl() {
        let store = MemoryMessageStore::new();
        let svc = service(&store);
        let now = OffsetDateTime::UNIX_EPOCH;
        assert_eq!(svc.on_create(now), now + Duration::hours(2));
    }

    #[tokio::test]
    async fn test_pin_resets_deadline_from_now() {
        let store = MemoryMessageStore::new();
        let svc = service(&store);
        let t0 = OffsetDateTime::now_utc();
        let id = seed(&store, &svc, t0).await;

        let pinned = svc.pin(id, t0 + Duration::hours(1)).await.unwrap();
        assert_eq!(pinned.expire_at, t0 + Duration::hours(3));
        assert_eq!(store.get(id).await.unwrap().expire_at, t0 + Duration::hours(3));

        // Pinning again right away does not stack.
        svc.pin(id, t0 + Duration::hours(1)).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().expire_at, t0 + Duration::hours(3));
    }

    #[tokio::test]
    async fn test_pin_expired_but_unswept_message() {
        let store = MemoryMessageStore::new();
        let svc = service(&store);
        let t0 = OffsetDateTime::now_utc();
        let id = seed(&store, &svc, t0).await;

        let late = t0 + Duration::hours(5);
        svc.pin(id, late).await.unwrap();
        assert_eq!(svc.sweep(late).await.unwrap(), 0);
        assert_eq!(store.get(id).await.unwrap().expire_at, late + Duration::hours(2));
    }

    #[tokio::test]
    async fn test_pin_unknown_id_creates_nothing() {
        let store = MemoryMessageStore::new();
        let svc = service(&store);
        let res = svc.pin(Uuid::new_v4(), OffsetDateTime::now_utc()).await;
        assert!(matches!(res, Err(AppError::NotFound)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_now_twice() {
        let store = MemoryMessageStore::new();
        let svc = service(&store);
        let id = seed(&store, &svc, OffsetDateTime::now_utc()).await;

        svc.delete_now(id).await.unwrap();
        assert!(matches!(store.get(id).await, Err(AppError::NotFound)));
        assert!(matches!(svc.delete_now(id).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_sweep_deletes_exactly_the_expired_set() {
        let store = MemoryMessageStore::new();
        let svc = service(&store);
        let t0 = OffsetDateTime::now_utc();

        let old = seed(&store, &svc, t0).await;
        let boundary = seed(&store, &svc, t0 + Duration::minutes(30)).await;
        let fresh = seed(&store, &svc, t0 + Duration::hours(1)).await;

        // `boundary` expires exactly at the sweep time and must go.
        let now = t0 + Duration::minutes(150);
        assert_eq!(svc.sweep(now).await.unwrap(), 2);
        assert!(store.get(old).await.is_err());
        assert!(store.get(boundary).await.is_err());
        assert!(store.get(fresh).await.is_ok());

        assert_eq!(svc.sweep(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_sweeps_both_succeed() {
        let store = MemoryMessageStore::new();
        let svc = service(&store);
        let t0 = OffsetDateTime::now_utc();
        for i in 0..50 {
            seed(&store, &svc, t0 + Duration::seconds(i)).await;
        }

        let now = t0 + Duration::hours(3);
        let (a, b) = tokio::join!(svc.sweep(now), svc.sweep(now));
        assert_eq!(a.unwrap() + b.unwrap(), 50);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_reports_partial_bulk_delete() {
        let inner = MemoryMessageStore::new();
        let store = Arc::new(FlakyBulkDeleteStore { inner: inner.clone() });
        let svc = RetentionService::new(store, RetentionPolicy::new(Duration::hours(2)).unwrap());
        let t0 = OffsetDateTime::now_utc();
        for i in 0..3 {
            seed(&inner, &svc, t0 + Duration::seconds(i)).await;
        }

        let now = t0 + Duration::hours(3);
        assert_eq!(svc.sweep(now).await.unwrap(), 1);
        assert_eq!(inner.query_expired(now).await.unwrap().len(), 2);

        // Leftovers stay expired and are picked up by later sweeps.
        assert_eq!(svc.sweep(now).await.unwrap(), 1);
        assert_eq!(svc.sweep(now).await.unwrap(), 1);
        assert!(inner.is_empty());
    }
}
