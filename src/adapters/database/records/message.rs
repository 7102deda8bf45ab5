use crate::domain::message::Message;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRecord {
    pub(crate) id: Uuid,
    pub(crate) recipient: String,
    pub(crate) body: Vec<u8>,
    pub(crate) received_at: OffsetDateTime,
    pub(crate) expire_at: OffsetDateTime,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            to: record.recipient,
            body: record.body,
            received_at: record.received_at,
            expire_at: record.expire_at,
        }
    }
}
