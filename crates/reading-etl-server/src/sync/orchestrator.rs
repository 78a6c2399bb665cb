//! One synchronization cycle
//!
//! Ensure the schema, fetch one bounded batch, then for each document in order:
//! decode, upsert, and acknowledge only after the upsert succeeded. Schema and
//! fetch failures abort the cycle; anything that goes wrong with a single
//! document is logged, recorded in the [`SyncReport`] and left for a later cycle.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{
    decode::decode_document,
    error::{DocumentError, SyncError},
    schema::SchemaManager,
    source::DocumentSource,
    target::AnalyticsWriter,
    types::{PendingDocument, SyncReport, UpsertOutcome, DEFAULT_BATCH_SIZE},
};

pub struct SyncOrchestrator {
    schema: Arc<dyn SchemaManager>,
    source: Arc<dyn DocumentSource>,
    writer: Arc<dyn AnalyticsWriter>,
    batch_size: usize,
}

impl SyncOrchestrator {
    pub fn new(
        schema: Arc<dyn SchemaManager>,
        source: Arc<dyn DocumentSource>,
        writer: Arc<dyn AnalyticsWriter>,
    ) -> Self {
        Self {
            schema,
            source,
            writer,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the fetch limit; zero keeps the current value.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        if batch_size > 0 {
            self.batch_size = batch_size;
        }
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run one cycle over at most `batch_size` documents.
    #[tracing::instrument(skip(self), fields(batch_size = self.batch_size))]
    pub async fn run_cycle(&self) -> Result<SyncReport, SyncError> {
        self.schema
            .ensure_schema()
            .await
            .map_err(SyncError::Schema)?;

        let batch = self
            .source
            .fetch_batch(self.batch_size)
            .await
            .map_err(SyncError::SourceQuery)?;

        let mut report = SyncReport {
            fetched: batch.len(),
            ..Default::default()
        };

        if batch.is_empty() {
            debug!("No pending documents");
            return Ok(report);
        }

        info!(fetched = batch.len(), "Processing pending documents");

        for document in &batch {
            match self.process_document(document, &mut report).await {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    error!(mongo_id = %e.mongo_id(), stage = e.stage().as_str(), "{}", e);
                    report.failures.push(e.to_failure());
                },
            }
        }

        info!(
            fetched = report.fetched,
            processed = report.processed,
            already_present = report.already_present,
            failed = report.failed_count(),
            decode_warnings = report.decode_warnings,
            "Sync cycle completed"
        );

        Ok(report)
    }

    async fn process_document(
        &self,
        document: &PendingDocument,
        report: &mut SyncReport,
    ) -> Result<(), DocumentError> {
        let decoded = decode_document(document);
        let mongo_id = decoded.record.mongo_id.clone();

        for warning in &decoded.warnings {
            warn!(mongo_id = %mongo_id, field = warning.field(), "{}", warning);
        }
        report.decode_warnings += decoded.warnings.len();

        let outcome = self
            .writer
            .upsert(&decoded.record)
            .await
            .map_err(|source| DocumentError::Write {
                mongo_id: mongo_id.clone(),
                source,
            })?;

        if outcome == UpsertOutcome::AlreadyPresent {
            debug!(mongo_id = %mongo_id, "Analytics record already present");
            report.already_present += 1;
        }

        self.source
            .acknowledge(&document.id)
            .await
            .map_err(|source| DocumentError::Acknowledge {
                mongo_id: mongo_id.clone(),
                source,
            })?;

        debug!(mongo_id = %mongo_id, "Document processed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::sync::memory::{MemoryAnalyticsStore, MemoryDocumentStore};
    use crate::sync::types::{DocumentStatus, FailureStage};
    use mongodb::bson::doc;

    fn orchestrator(
        docs: &Arc<MemoryDocumentStore>,
        analytics: &Arc<MemoryAnalyticsStore>,
    ) -> SyncOrchestrator {
        SyncOrchestrator::new(analytics.clone(), docs.clone(), analytics.clone())
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let analytics = Arc::new(MemoryAnalyticsStore::new());

        let report = orchestrator(&docs, &analytics).run_cycle().await.unwrap();
        assert_eq!(report, SyncReport::default());
        assert_eq!(analytics.ensure_calls().await, 1);
    }

    #[tokio::test]
    async fn test_source_query_failure_is_fatal() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let analytics = Arc::new(MemoryAnalyticsStore::new());
        docs.insert(doc! { "_id": "a", "status": "ingested" }).await;
        docs.fail_queries(true).await;

        let err = orchestrator(&docs, &analytics).run_cycle().await.unwrap_err();
        assert!(matches!(err, SyncError::SourceQuery(_)));
        assert_eq!(analytics.total_upsert_calls().await, 0);
        assert_eq!(docs.status_of("a").await, Some(DocumentStatus::Ingested));
    }

    #[tokio::test]
    async fn test_decode_warnings_do_not_block_processing() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let analytics = Arc::new(MemoryAnalyticsStore::new());
        docs.insert(doc! { "_id": "sparse", "status": "ingested" }).await;

        let report = orchestrator(&docs, &analytics).run_cycle().await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.decode_warnings, 5);
        assert_eq!(docs.status_of("sparse").await, Some(DocumentStatus::Processed));
    }

    #[tokio::test]
    async fn test_acknowledge_failure_keeps_written_row() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let analytics = Arc::new(MemoryAnalyticsStore::new());
        docs.insert(doc! { "_id": "gone", "status": "ingested" }).await;
        docs.fail_acknowledge_for("gone").await;

        let report = orchestrator(&docs, &analytics).run_cycle().await.unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, FailureStage::Acknowledge);
        assert!(analytics.find_record("gone").await.is_some());
    }

    #[test]
    fn test_with_batch_size_ignores_zero() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let analytics = Arc::new(MemoryAnalyticsStore::new());

        let orch = orchestrator(&docs, &analytics).with_batch_size(0);
        assert_eq!(orch.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(orch.with_batch_size(7).batch_size(), 7);
    }
}
