//! Core types for the reading sync

use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fetch limit used when no override is configured
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Status of a pending document in the source collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Ingested,
    Processed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Ingested => "ingested",
            DocumentStatus::Processed => "processed",
        }
    }

    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value.as_str()? {
            "ingested" => Some(DocumentStatus::Ingested),
            "processed" => Some(DocumentStatus::Processed),
            _ => None,
        }
    }
}

/// Identifier of a pending document (its `_id`)
///
/// The raw value is kept so the source can address the document again;
/// [`DocumentId::key`] is the text form stored as `mongo_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentId(Bson);

impl DocumentId {
    pub fn new(raw: Bson) -> Self {
        Self(raw)
    }

    pub fn as_bson(&self) -> &Bson {
        &self.0
    }

    /// ObjectIds map to lowercase hex, strings to themselves, anything else
    /// to relaxed extended JSON.
    pub fn key(&self) -> String {
        match &self.0 {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(s) => s.clone(),
            other => other.clone().into_relaxed_extjson().to_string(),
        }
    }
}

impl From<ObjectId> for DocumentId {
    fn from(oid: ObjectId) -> Self {
        Self(Bson::ObjectId(oid))
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(Bson::String(id.to_string()))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A staged event document waiting to be copied into the analytics table
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDocument {
    pub id: DocumentId,
    pub body: Document,
}

impl PendingDocument {
    /// Wrap a raw document; `None` when it has no `_id`.
    pub fn from_document(body: Document) -> Option<Self> {
        let id = DocumentId::new(body.get("_id")?.clone());
        Some(Self { id, body })
    }
}

/// Row written to the analytics table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub mongo_id: String,
    pub event_timestamp: Option<DateTime<Utc>>,
    pub source: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub meta: serde_json::Value,
}

/// Analytics row as read back, including server-assigned columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredRecord {
    pub id: i32,
    pub mongo_id: String,
    pub event_timestamp: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub event_type: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Successful upsert result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// A row with the same `mongo_id` already existed; the incoming data was discarded.
    AlreadyPresent,
}

/// Stage at which a document failed within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Write,
    Acknowledge,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Write => "write",
            FailureStage::Acknowledge => "acknowledge",
        }
    }
}

/// A document left in `ingested` state by a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub mongo_id: String,
    pub stage: FailureStage,
    pub message: String,
}

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Documents returned by the source
    pub fetched: usize,
    /// Documents both written and acknowledged
    pub processed: usize,
    /// Writes that hit an existing row
    pub already_present: usize,
    /// Fields that fell back to a default while decoding
    pub decode_warnings: usize,
    pub failures: Vec<DocumentFailure>,
}

impl SyncReport {
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn failed_ids(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.mongo_id.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// Result handed back to whoever triggered a cycle
///
/// Error outcomes never carry counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    pub fn success(report: &SyncReport) -> Self {
        Self {
            status: OutcomeStatus::Success,
            processed_count: Some(report.processed),
            failed_count: Some(report.failed_count()),
            failed_ids: Some(report.failed_ids()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            processed_count: None,
            failed_count: None,
            failed_ids: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
