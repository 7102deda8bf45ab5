use crate::api::AppState;
use crate::api::dto::action::ActionForm;
use crate::error::{AppError, Result};
use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::{HeaderMap, Uri, header},
    response::Redirect,
};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Pin,
    Delete,
}

impl Action {
    fn parse(raw: Option<&str>) -> Result<Self> {
        match raw {
            Some("pin") => Ok(Self::Pin),
            Some("delete") => Ok(Self::Delete),
            Some(other) => Err(AppError::InvalidRequest(format!("Unknown action: {other}"))),
            None => Err(AppError::InvalidRequest("Missing action".to_string())),
        }
    }
}

/// Pins or deletes a message, then sends the browser back where it came from.
///
/// Only mounted for POST, so other methods get a 405 before reaching here.
///
/// # Errors
/// Returns `AppError::InvalidRequest` if the form, action, or id is missing or malformed.
/// Returns `AppError::NotFound` if the message does not exist.
pub async fn perform_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: std::result::Result<Form<ActionForm>, FormRejection>,
) -> Result<Redirect> {
    let Form(form) = form.map_err(|e| AppError::InvalidRequest(format!("Invalid form: {e}")))?;

    let action = Action::parse(form.action.as_deref())?;
    let id = form
        .id
        .as_deref()
        .ok_or_else(|| AppError::InvalidRequest("Missing message id".to_string()))
        .and_then(|raw| Uuid::parse_str(raw).map_err(|e| AppError::InvalidRequest(format!("Invalid message id: {e}"))))?;

    match action {
        Action::Pin => {
            state.retention_service.pin(id, OffsetDateTime::now_utc()).await?;
        }
        Action::Delete => state.retention_service.delete_now(id).await?,
    }

    Ok(Redirect::to(redirect_target(&headers)))
}

/// The page the form was posted from, as long as it is on this host; `/` otherwise.
fn redirect_target(headers: &HeaderMap) -> &str {
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|referer| is_same_origin(referer, host))
        .unwrap_or("/")
}

fn is_same_origin(referer: &str, host: Option<&str>) -> bool {
    let Ok(uri) = referer.parse::<Uri>() else {
        return false;
    };
    match (uri.scheme_str(), uri.authority()) {
        (Some("http" | "https"), Some(authority)) => {
            host.is_some_and(|host| authority.as_str().eq_ignore_ascii_case(host))
        }
        (None, None) => referer.starts_with('/') && !referer.starts_with("//"),
        _ => false,
    }
}
