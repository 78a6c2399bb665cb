//! Shared fixtures for the integration tests
//!
//! Everything here runs against the in-memory stores; the tests that need a
//! real PostgreSQL and MongoDB build their own handles and are `#[ignore]`d.

#![allow(dead_code)]

use mongodb::bson::{doc, Document};
use reading_etl_server::sync::{
    MemoryAnalyticsStore, MemoryDocumentStore, SyncOrchestrator, SyncService, DEFAULT_SYNC_TIMEOUT,
};
use std::sync::Arc;

/// Both in-memory stores plus an orchestrator wired to them
pub struct Harness {
    pub docs: Arc<MemoryDocumentStore>,
    pub analytics: Arc<MemoryAnalyticsStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            docs: Arc::new(MemoryDocumentStore::new()),
            analytics: Arc::new(MemoryAnalyticsStore::new()),
        }
    }

    /// Insert `count` pending documents with ids `reading-0..count`.
    pub async fn seed(&self, count: usize) -> Vec<String> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let id = format!("reading-{i}");
            self.docs.insert(reading(&id)).await;
            ids.push(id);
        }
        ids
    }

    pub fn orchestrator(&self) -> SyncOrchestrator {
        SyncOrchestrator::new(
            self.analytics.clone(),
            self.docs.clone(),
            self.analytics.clone(),
        )
    }

    pub fn service(&self) -> SyncService {
        SyncService::new(self.orchestrator(), DEFAULT_SYNC_TIMEOUT)
    }
}

/// A well-formed pending reading
pub fn reading(id: &str) -> Document {
    doc! {
        "_id": id,
        "status": "ingested",
        "event_type": "cpu_reading",
        "source": "test-agent",
        "timestamp": "2026-01-04T12:00:00Z",
        "payload": { "value": 99 },
        "meta": { "host": "localhost" }
    }
}
