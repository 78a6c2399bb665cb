//! Time-based sync trigger

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::service::SyncService;

/// Runs a sync cycle every `interval` in the background
pub struct SyncScheduler {
    service: Arc<SyncService>,
    interval: Duration,
}

impl SyncScheduler {
    pub fn new(service: Arc<SyncService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Start the scheduler in background. The first cycle runs one interval after start.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "Sync scheduler started");

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let outcome = self.service.trigger().await;
                if !outcome.is_success() {
                    warn!(
                        error = outcome.error.as_deref().unwrap_or_default(),
                        "Scheduled sync failed; retrying next interval"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::sync::{
        memory::{MemoryAnalyticsStore, MemoryDocumentStore},
        orchestrator::SyncOrchestrator,
        service::DEFAULT_SYNC_TIMEOUT,
    };
    use mongodb::bson::doc;

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_runs_on_interval() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let analytics = Arc::new(MemoryAnalyticsStore::new());
        docs.insert(doc! { "_id": "a", "status": "ingested" }).await;

        let service = Arc::new(SyncService::new(
            SyncOrchestrator::new(analytics.clone(), docs.clone(), analytics.clone()),
            DEFAULT_SYNC_TIMEOUT,
        ));

        let handle = SyncScheduler::new(service, Duration::from_secs(60)).start();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(docs.fetch_count().await, 0);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(docs.fetch_count().await, 1);
        assert_eq!(docs.pending_count().await, 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(docs.fetch_count().await, 2);

        handle.abort();
    }
}
