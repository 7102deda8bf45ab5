use crate::api::render::HtmlRenderer;
use crate::config::Config;
use crate::services::health_service::HealthService;
use crate::services::inbox_service::InboxService;
use crate::services::ingest_service::IngestService;
use crate::services::retention_service::RetentionService;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod actions;
pub mod dto;
pub mod health;
pub mod inbound;
pub mod inbox;
pub mod middleware;
pub mod render;

#[derive(Clone, Debug)]
pub struct AppState {
    pub inbox_service: InboxService,
    pub retention_service: RetentionService,
    pub ingest_service: IngestService,
    pub renderer: Arc<HtmlRenderer>,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
    pub retention_service: RetentionService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub inbox_service: InboxService,
    pub retention_service: RetentionService,
    pub ingest_service: IngestService,
    pub health_service: HealthService,
}

/// Configures and returns the public router: inbox pages, actions, and ingestion.
pub fn app_router(config: &Config, services: &ServiceContainer) -> Router {
    let state = AppState {
        inbox_service: services.inbox_service.clone(),
        retention_service: services.retention_service.clone(),
        ingest_service: services.ingest_service.clone(),
        renderer: Arc::new(HtmlRenderer::new(&config.inbox.domain)),
    };

    let inbound_routes = Router::new()
        .route("/inbound/{recipient}", post(inbound::receive_mail))
        .layer(DefaultBodyLimit::max(config.inbox.max_message_bytes));

    let api_routes = Router::new()
        .route("/inbox/{local_part}", get(inbox::list_inbox))
        .route("/messages/{id}", get(inbox::get_message));

    Router::new()
        .route("/", get(inbox::index))
        .route("/action", post(actions::perform_action))
        .route("/{local_part}", get(inbox::view_inbox))
        .nest("/api", api_routes)
        .merge(inbound_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(PropagateRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            middleware::MakeRequestUuidV7,
        ))
        .with_state(state)
}

/// Management router: health probes and the external sweep trigger.
pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .route("/sweep", post(health::trigger_sweep))
        .with_state(state)
}
