#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::MessageStore;
use crate::adapters::database::{DbPool, MessageRepository};
use crate::adapters::memory::MemoryMessageStore;
use crate::api::ServiceContainer;
use crate::config::{Config, StorageBackend};
use crate::domain::message::RetentionPolicy;
use crate::services::health_service::HealthService;
use crate::services::inbox_service::InboxService;
use crate::services::ingest_service::IngestService;
use crate::services::retention_service::RetentionService;
use crate::workers::SweepWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Background tasks owned by the process.
#[derive(Debug)]
pub struct Workers {
    sweep: Option<SweepWorker>,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();
        if let Some(sweep) = self.sweep {
            tasks.push(tokio::spawn(sweep.run(shutdown_rx)));
        } else {
            tracing::info!("Background sweep disabled; relying on an external trigger");
        }
        tasks
    }
}

#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub workers: Workers,
}

/// Wires the message store into the services and workers.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    store: Option<Arc<dyn MessageStore>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, store: None }
    }

    #[must_use]
    pub fn with_database(mut self, pool: DbPool) -> Self {
        self.store = Some(Arc::new(MessageRepository::new(pool, self.config.retention.delete_batch_size)));
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// # Errors
    /// Returns an error if no store was provided or the retention settings are invalid.
    pub fn build(self) -> anyhow::Result<App> {
        let store = self.store.ok_or_else(|| anyhow::anyhow!("message store is required"))?;

        let policy = RetentionPolicy::new(time::Duration::seconds(self.config.retention.ttl_secs))?;
        tracing::info!(ttl = %policy.default_ttl(), domain = %self.config.inbox.domain, "Retention policy configured");

        let retention_service = RetentionService::new(Arc::clone(&store), policy);
        let ingest_service = IngestService::new(Arc::clone(&store), retention_service.clone());
        let inbox_service =
            InboxService::new(Arc::clone(&store), self.config.inbox.domain.clone(), self.config.inbox.list_limit);
        let health_service = HealthService::new(store, self.config.health.clone());

        let sweep = (self.config.retention.sweep_interval_secs > 0).then(|| {
            SweepWorker::new(retention_service.clone(), Duration::from_secs(self.config.retention.sweep_interval_secs))
        });

        Ok(App {
            services: ServiceContainer { inbox_service, retention_service, ingest_service, health_service },
            workers: Workers { sweep },
        })
    }
}

/// Connects the configured backend, running migrations for Postgres.
///
/// # Errors
/// Returns an error if the database cannot be reached or migrated.
pub async fn init_store(config: &Config) -> anyhow::Result<AppBuilder> {
    let builder = AppBuilder::new(config.clone());
    match config.database.backend {
        StorageBackend::Postgres => {
            let pool = adapters::database::init_pool(&config.database).await?;
            run_migrations(&pool).await?;
            Ok(builder.with_database(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; messages will not survive a restart");
            Ok(builder.with_store(Arc::new(MemoryMessageStore::new())))
        }
    }
}

/// # Errors
/// Returns an error if a migration fails.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through tracing so they reach the configured log sink.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        tracing::error!(panic = %info, %location, "Process panicked");
    }));
}
