use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// A received mail as it is stored: raw bytes plus its retention deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub to: String,
    pub body: Vec<u8>,
    pub received_at: OffsetDateTime,
    pub expire_at: OffsetDateTime,
}

impl Message {
    /// A message is due for deletion once the clock reaches its deadline.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expire_at <= now
    }
}

/// A message that has not been assigned an id yet.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub to: String,
    pub body: Vec<u8>,
    pub received_at: OffsetDateTime,
    pub expire_at: OffsetDateTime,
}

impl NewMessage {
    #[must_use]
    pub fn into_message(self, id: Uuid) -> Message {
        Message { id, to: self.to, body: self.body, received_at: self.received_at, expire_at: self.expire_at }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RetentionError {
    #[error("Message TTL must be positive, got {0}")]
    NonPositiveTtl(Duration),
    #[error("Message TTL of {0} is past the representable date range")]
    TtlOutOfRange(Duration),
}

/// Time-to-live applied on receipt and again on every pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    default_ttl: Duration,
}

impl RetentionPolicy {
    /// Builds a policy, refusing TTLs that would create already-expired messages
    /// or deadlines the calendar cannot hold.
    ///
    /// # Errors
    /// Returns `RetentionError::NonPositiveTtl` if `default_ttl` is zero or negative.
    /// Returns `RetentionError::TtlOutOfRange` if adding it to the current time overflows.
    pub fn new(default_ttl: Duration) -> Result<Self, RetentionError> {
        if default_ttl <= Duration::ZERO {
            return Err(RetentionError::NonPositiveTtl(default_ttl));
        }
        if OffsetDateTime::now_utc().checked_add(default_ttl).is_none() {
            return Err(RetentionError::TtlOutOfRange(default_ttl));
        }
        Ok(Self { default_ttl })
    }

    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Clamped to the latest representable instant rather than overflowing.
    #[must_use]
    pub fn expire_at_from(&self, now: OffsetDateTime) -> OffsetDateTime {
        now.saturating_add(self.default_ttl)
    }
}
