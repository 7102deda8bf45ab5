use crate::adapters::MessageStore;
use crate::config::HealthConfig;
use opentelemetry::{KeyValue, global, metrics::Histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

#[derive(Clone, Debug)]
struct Metrics {
    check_duration_seconds: Histogram<f64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("spamme-server");
        Self {
            check_duration_seconds: meter
                .f64_histogram("health_check_duration_seconds")
                .with_description("Duration of health checks")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    store: Arc<dyn MessageStore>,
    config: HealthConfig,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>, config: HealthConfig) -> Self {
        Self { store, config, metrics: Metrics::new() }
    }

    /// # Errors
    /// Returns a description of the failure if the store does not answer in time.
    pub async fn check_store(&self) -> Result<(), String> {
        let store_timeout = Duration::from_millis(self.config.store_timeout_ms);
        let start = Instant::now();

        let res = match timeout(store_timeout, self.store.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("Store check failed: {e}")),
            Err(_) => Err("Store check timed out".to_string()),
        };

        self.metrics.check_duration_seconds.record(start.elapsed().as_secs_f64(), &[KeyValue::new("component", "store")]);
        res
    }
}
