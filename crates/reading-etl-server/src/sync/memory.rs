//! In-process stores
//!
//! Hold documents and analytics rows in memory behind the same traits as the
//! MongoDB and PostgreSQL implementations. Failures can be injected per call
//! site so every branch of a cycle can be exercised without external services.

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{Bson, Document};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

use super::{
    error::StoreError,
    schema::SchemaManager,
    source::DocumentSource,
    target::AnalyticsWriter,
    types::{AnalyticsRecord, DocumentId, DocumentStatus, PendingDocument, StoredRecord, UpsertOutcome},
};

#[derive(Default)]
struct DocumentState {
    documents: Vec<Document>,
    fail_queries: bool,
    failing_acks: HashSet<String>,
    fetch_calls: usize,
    ack_calls: usize,
}

/// Pending-document collection kept in insertion order
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<DocumentState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, document: Document) {
        self.state.lock().await.documents.push(document);
    }

    /// Make every subsequent `fetch_batch` fail until turned off again.
    pub async fn fail_queries(&self, fail: bool) {
        self.state.lock().await.fail_queries = fail;
    }

    /// Make `acknowledge` fail for the document whose key is `mongo_id`.
    pub async fn fail_acknowledge_for(&self, mongo_id: &str) {
        self.state.lock().await.failing_acks.insert(mongo_id.to_string());
    }

    pub async fn clear_ack_failures(&self) {
        self.state.lock().await.failing_acks.clear();
    }

    /// Drop a document entirely, as if deleted by another actor.
    pub async fn remove(&self, mongo_id: &str) -> bool {
        let mut state = self.state.lock().await;
        let before = state.documents.len();
        state.documents.retain(|d| key_of(d).as_deref() != Some(mongo_id));
        state.documents.len() != before
    }

    pub async fn status_of(&self, mongo_id: &str) -> Option<DocumentStatus> {
        let state = self.state.lock().await;
        state
            .documents
            .iter()
            .find(|d| key_of(d).as_deref() == Some(mongo_id))
            .and_then(|d| d.get("status"))
            .and_then(DocumentStatus::from_bson)
    }

    pub async fn pending_count(&self) -> usize {
        let state = self.state.lock().await;
        state.documents.iter().filter(|d| is_ingested(d)).count()
    }

    pub async fn fetch_count(&self) -> usize {
        self.state.lock().await.fetch_calls
    }

    pub async fn ack_count(&self) -> usize {
        self.state.lock().await.ack_calls
    }
}

fn key_of(document: &Document) -> Option<String> {
    document.get("_id").map(|id| DocumentId::new(id.clone()).key())
}

fn is_ingested(document: &Document) -> bool {
    document.get("status").and_then(DocumentStatus::from_bson) == Some(DocumentStatus::Ingested)
}

#[async_trait]
impl DocumentSource for MemoryDocumentStore {
    async fn fetch_batch(&self, limit: usize) -> Result<Vec<PendingDocument>, StoreError> {
        let mut state = self.state.lock().await;
        state.fetch_calls += 1;

        if state.fail_queries {
            return Err(StoreError::Unavailable("document store query failed".to_string()));
        }

        Ok(state
            .documents
            .iter()
            .filter(|d| is_ingested(d))
            .filter_map(|d| PendingDocument::from_document(d.clone()))
            .take(limit)
            .collect())
    }

    async fn acknowledge(&self, id: &DocumentId) -> Result<(), StoreError> {
        let key = id.key();
        let mut state = self.state.lock().await;
        state.ack_calls += 1;

        if state.failing_acks.contains(&key) {
            return Err(StoreError::Unavailable(format!("acknowledge rejected for {key}")));
        }

        let document = state
            .documents
            .iter_mut()
            .find(|d| d.get("_id") == Some(id.as_bson()))
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;

        document.insert("status", Bson::String(DocumentStatus::Processed.as_str().to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct AnalyticsState {
    rows: Vec<StoredRecord>,
    fail_schema: bool,
    failing_upserts: HashSet<String>,
    schema_ready: bool,
    ensure_calls: usize,
    upsert_calls: HashMap<String, usize>,
}

/// Analytics table kept in memory; also acts as its own schema manager
#[derive(Default)]
pub struct MemoryAnalyticsStore {
    state: Mutex<AnalyticsState>,
}

impl MemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_schema(&self, fail: bool) {
        self.state.lock().await.fail_schema = fail;
    }

    pub async fn fail_upsert_for(&self, mongo_id: &str) {
        self.state.lock().await.failing_upserts.insert(mongo_id.to_string());
    }

    pub async fn clear_upsert_failures(&self) {
        self.state.lock().await.failing_upserts.clear();
    }

    pub async fn find_record(&self, mongo_id: &str) -> Option<StoredRecord> {
        let state = self.state.lock().await;
        state.rows.iter().find(|r| r.mongo_id == mongo_id).cloned()
    }

    pub async fn record_count(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    /// Upsert attempts seen for `mongo_id`, failed ones included.
    pub async fn upsert_calls(&self, mongo_id: &str) -> usize {
        let state = self.state.lock().await;
        state.upsert_calls.get(mongo_id).copied().unwrap_or(0)
    }

    pub async fn total_upsert_calls(&self) -> usize {
        self.state.lock().await.upsert_calls.values().sum()
    }

    pub async fn ensure_calls(&self) -> usize {
        self.state.lock().await.ensure_calls
    }
}

#[async_trait]
impl SchemaManager for MemoryAnalyticsStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.ensure_calls += 1;

        if state.fail_schema {
            return Err(StoreError::Unavailable("relational store unreachable".to_string()));
        }
        state.schema_ready = true;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsWriter for MemoryAnalyticsStore {
    async fn upsert(&self, record: &AnalyticsRecord) -> Result<UpsertOutcome, StoreError> {
        let mut state = self.state.lock().await;
        *state.upsert_calls.entry(record.mongo_id.clone()).or_default() += 1;

        if !state.schema_ready {
            return Err(StoreError::Unavailable("analytics table does not exist".to_string()));
        }
        if state.failing_upserts.contains(&record.mongo_id) {
            return Err(StoreError::Unavailable(format!(
                "write rejected for {}",
                record.mongo_id
            )));
        }
        if state.rows.iter().any(|r| r.mongo_id == record.mongo_id) {
            return Ok(UpsertOutcome::AlreadyPresent);
        }

        let id = i32::try_from(state.rows.len() + 1).unwrap_or(i32::MAX);
        state.rows.push(StoredRecord {
            id,
            mongo_id: record.mongo_id.clone(),
            event_timestamp: record.event_timestamp,
            source: Some(record.source.clone()),
            event_type: Some(record.event_type.clone()),
            payload: Some(record.payload.clone()),
            meta: Some(record.meta.clone()),
            created_at: Utc::now(),
        });
        Ok(UpsertOutcome::Inserted)
    }
}
