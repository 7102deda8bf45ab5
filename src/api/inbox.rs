use crate::api::AppState;
use crate::api::dto::inbox::{InboxEntry, InboxResponse};
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Path, State},
    response::{Html, IntoResponse},
};
use uuid::Uuid;

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Html(state.renderer.index().to_string())
}

/// Renders the inbox for a local part as HTML.
///
/// # Errors
/// Returns `AppError::StoreUnavailable` if the listing fails.
pub async fn view_inbox(State(state): State<AppState>, Path(local_part): Path<String>) -> Result<Html<String>> {
    let messages = state.inbox_service.list_inbox(&local_part).await?;
    let entries: Vec<InboxEntry> = messages.iter().map(InboxEntry::from).collect();
    let address = state.inbox_service.address_for(&local_part);
    Ok(Html(state.renderer.inbox(&address, &entries)))
}

/// Same listing as [`view_inbox`], as JSON.
///
/// # Errors
/// Returns `AppError::StoreUnavailable` if the listing fails.
pub async fn list_inbox(State(state): State<AppState>, Path(local_part): Path<String>) -> Result<Json<InboxResponse>> {
    let messages = state.inbox_service.list_inbox(&local_part).await?;
    Ok(Json(InboxResponse {
        address: state.inbox_service.address_for(&local_part),
        messages: messages.iter().map(InboxEntry::from).collect(),
    }))
}

/// # Errors
/// Returns `AppError::InvalidRequest` if the id is not a UUID.
/// Returns `AppError::NotFound` if the message does not exist.
pub async fn get_message(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<InboxEntry>> {
    let id = Uuid::parse_str(&id).map_err(|e| AppError::InvalidRequest(format!("Invalid message id: {e}")))?;
    let message = state.inbox_service.get_message(id).await?;
    Ok(Json(InboxEntry::from(&message)))
}
