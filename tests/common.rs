#![allow(dead_code, unreachable_pub, missing_debug_implementations, clippy::unwrap_used, clippy::missing_panics_doc)]

use spamme_server::adapters::memory::MemoryMessageStore;
use spamme_server::adapters::MessageStore;
use spamme_server::api::{self, MgmtState, ServiceContainer};
use spamme_server::config::{
    Config, DatabaseConfig, HealthConfig, InboxConfig, LogFormat, RetentionConfig, ServerConfig, StorageBackend,
    TelemetryConfig,
};
use std::net::SocketAddr;
use std::sync::{Arc, Once};
use tokio::net::TcpListener;

static INIT: Once = Once::new();

pub const DOMAIN: &str = "test.example";

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("spamme_server=debug".parse().unwrap())
            .add_directive("sqlx=warn".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn get_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            shutdown_timeout_secs: 1,
            request_timeout_secs: 10,
        },
        database: DatabaseConfig {
            backend: StorageBackend::Memory,
            url: std::env::var("DATABASE_URL").ok(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 60,
            max_lifetime_secs: 300,
        },
        inbox: InboxConfig { domain: DOMAIN.to_string(), list_limit: 100, max_message_bytes: 64 * 1024 },
        retention: RetentionConfig { ttl_secs: 7200, sweep_interval_secs: 0, delete_batch_size: 100 },
        health: HealthConfig { store_timeout_ms: 500 },
        telemetry: TelemetryConfig { otlp_endpoint: None, log_format: LogFormat::Text },
    }
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub config: Config,
    pub store: Arc<dyn MessageStore>,
    pub services: ServiceContainer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        Self::spawn_with_store(config, Arc::new(MemoryMessageStore::new())).await
    }

    pub async fn spawn_with_store(config: Config, store: Arc<dyn MessageStore>) -> Self {
        setup_tracing();

        let app = spamme_server::AppBuilder::new(config.clone()).with_store(Arc::clone(&store)).build().unwrap();

        let app_router = api::app_router(&config, &app.services);
        let mgmt_router = api::mgmt_router(MgmtState {
            health_service: app.services.health_service.clone(),
            retention_service: app.services.retention_service.clone(),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mgmt_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app_router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt_router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        let client = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none()).build().unwrap();

        Self {
            server_url: format!("http://{addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client,
            config,
            store,
            services: app.services,
        }
    }

    /// Posts a raw message to the ingestion endpoint and asserts it was accepted.
    pub async fn deliver(&self, recipient: &str, raw: &str) {
        let resp = self
            .client
            .post(format!("{}/inbound/{recipient}", self.server_url))
            .body(raw.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);
    }

    pub async fn inbox_json(&self, local_part: &str) -> serde_json::Value {
        let resp = self.client.get(format!("{}/api/inbox/{local_part}", self.server_url)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        resp.json().await.unwrap()
    }

    pub async fn post_action(&self, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(format!("{}/action", self.server_url))
            .header(reqwest::header::REFERER, format!("{}/foo", self.server_url))
            .form(form)
            .send()
            .await
            .unwrap()
    }
}

pub fn sample_mail(subject: &str, body: &str) -> String {
    format!("From: sender@elsewhere.example\r\nTo: foo@{DOMAIN}\r\nSubject: {subject}\r\n\r\n{body}\r\n")
}
