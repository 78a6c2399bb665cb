//! Shared entry point for every sync trigger

use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{
    error::SyncError,
    orchestrator::SyncOrchestrator,
    types::{SyncOutcome, SyncReport},
};

/// Per-invocation budget when `SYNC_TIMEOUT_SECS` is unset
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs cycles one at a time, each bounded by a timeout
///
/// Triggers inside the same process queue on an internal lock. Separate
/// processes are not coordinated; the idempotent upsert keeps that safe.
pub struct SyncService {
    orchestrator: SyncOrchestrator,
    timeout: Duration,
    running: Mutex<()>,
}

impl SyncService {
    pub fn new(orchestrator: SyncOrchestrator, timeout: Duration) -> Self {
        Self {
            orchestrator,
            timeout,
            running: Mutex::new(()),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.orchestrator.batch_size()
    }

    /// Wait for any cycle in flight, then run one. Waiting counts against the timeout.
    pub async fn run_once(&self) -> Result<SyncReport, SyncError> {
        let cycle = async {
            let _guard = self.running.lock().await;
            self.orchestrator.run_cycle().await
        };

        tokio::time::timeout(self.timeout, cycle)
            .await
            .map_err(|_| SyncError::Timeout(self.timeout))?
    }

    /// Run one cycle and fold the result into the outcome handed to callers.
    pub async fn trigger(&self) -> SyncOutcome {
        match self.run_once().await {
            Ok(report) => {
                info!(
                    processed = report.processed,
                    failed = report.failed_count(),
                    "Sync succeeded"
                );
                SyncOutcome::success(&report)
            },
            Err(e) => {
                error!(error = %e, "Sync failed");
                SyncOutcome::error(e.to_string())
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::sync::{
        error::StoreError,
        memory::{MemoryAnalyticsStore, MemoryDocumentStore},
        schema::SchemaManager,
        types::OutcomeStatus,
    };
    use async_trait::async_trait;
    use mongodb::bson::doc;
    use std::sync::Arc;

    struct StalledSchema;

    #[async_trait]
    impl SchemaManager for StalledSchema {
        async fn ensure_schema(&self) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_trigger_success_outcome() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let analytics = Arc::new(MemoryAnalyticsStore::new());
        docs.insert(doc! { "_id": "a", "status": "ingested" }).await;

        let service = SyncService::new(
            SyncOrchestrator::new(analytics.clone(), docs.clone(), analytics.clone()),
            DEFAULT_SYNC_TIMEOUT,
        );

        let outcome = service.trigger().await;
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.processed_count, Some(1));
        assert_eq!(outcome.failed_count, Some(0));
    }

    #[tokio::test]
    async fn test_trigger_schema_failure_outcome() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let analytics = Arc::new(MemoryAnalyticsStore::new());
        analytics.fail_schema(true).await;

        let service = SyncService::new(
            SyncOrchestrator::new(analytics.clone(), docs.clone(), analytics.clone()),
            DEFAULT_SYNC_TIMEOUT,
        );

        let outcome = service.trigger().await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.processed_count, None);
        assert!(outcome.error.unwrap().contains("schema"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_cycle_times_out() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let analytics = Arc::new(MemoryAnalyticsStore::new());

        let service = SyncService::new(
            SyncOrchestrator::new(Arc::new(StalledSchema), docs, analytics),
            Duration::from_secs(5),
        );

        let err = service.run_once().await.unwrap_err();
        assert!(matches!(err, SyncError::Timeout(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_concurrent_triggers_are_serialized() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let analytics = Arc::new(MemoryAnalyticsStore::new());
        for i in 0..10 {
            docs.insert(doc! { "_id": format!("doc-{i}"), "status": "ingested" })
                .await;
        }

        let service = Arc::new(SyncService::new(
            SyncOrchestrator::new(analytics.clone(), docs.clone(), analytics.clone()),
            DEFAULT_SYNC_TIMEOUT,
        ));

        let (a, b) = tokio::join!(service.trigger(), service.trigger());
        let total = a.processed_count.unwrap() + b.processed_count.unwrap();

        assert_eq!(total, 10);
        assert_eq!(analytics.record_count().await, 10);
        assert_eq!(analytics.total_upsert_calls().await, 10);
    }
}
