use crate::domain::mail::DisplayMail;
use crate::domain::message::Message;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// One message as the UI sees it: parsed where possible, raw otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntry {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub received_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expire_at: OffsetDateTime,
    pub subject: String,
    pub body: String,
    pub parsed: bool,
}

impl From<&Message> for InboxEntry {
    fn from(message: &Message) -> Self {
        let display = DisplayMail::from_raw(&message.body);
        Self {
            id: message.id,
            received_at: message.received_at,
            expire_at: message.expire_at,
            subject: display.subject,
            body: display.body,
            parsed: display.parsed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxResponse {
    pub address: String,
    pub messages: Vec<InboxEntry>,
}
