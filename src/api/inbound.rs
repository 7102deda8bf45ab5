use crate::api::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use time::OffsetDateTime;

/// Accepts a raw message for `recipient`.
///
/// Always answers 202 once the body is read. Storage failures are logged by
/// the ingest span and not reported back to the mail transport.
pub async fn receive_mail(State(state): State<AppState>, Path(recipient): Path<String>, body: Bytes) -> StatusCode {
    if let Err(e) = state.ingest_service.ingest(&recipient, body.to_vec(), OffsetDateTime::now_utc()).await {
        tracing::warn!(error = %e, "Dropping inbound message");
    }
    StatusCode::ACCEPTED
}
