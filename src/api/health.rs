use crate::api::MgmtState;
use crate::api::dto::health::{HealthResponse, SweepResponse};
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use time::OffsetDateTime;

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: checks that the message store answers.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let (status_code, store_status) = match state.health_service.check_store().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, component = "store", "Readiness probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, "error")
        }
    };

    let response = HealthResponse { status: store_status.to_string(), store: store_status.to_string() };
    (status_code, Json(response))
}

/// Runs one expiry sweep on demand, for deployments driven by an external scheduler.
///
/// # Errors
/// Returns `AppError::StoreUnavailable` if expired messages cannot be listed.
pub async fn trigger_sweep(State(state): State<MgmtState>) -> Result<Json<SweepResponse>> {
    let deleted = state.retention_service.sweep(OffsetDateTime::now_utc()).await?;
    Ok(Json(SweepResponse { deleted }))
}
