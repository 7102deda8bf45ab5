use crate::services::retention_service::RetentionService;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::Instrument;

/// Runs the expiry sweep on a fixed interval until shutdown.
#[derive(Debug)]
pub struct SweepWorker {
    retention: RetentionService,
    interval: Duration,
}

impl SweepWorker {
    #[must_use]
    pub const fn new(retention: RetentionService, interval: Duration) -> Self {
        Self { retention, interval }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    // Failures are already logged by the sweep span; the next tick tries again.
                    let _ = self.retention
                        .sweep(OffsetDateTime::now_utc())
                        .instrument(tracing::info_span!("sweep_iteration"))
                        .await;
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Sweep loop shutting down...");
    }
}
