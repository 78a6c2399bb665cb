//! Document-store to analytics-table synchronization
//!
//! A cycle moves pending documents from MongoDB into PostgreSQL:
//!
//! 1. ensure the analytics table exists
//! 2. fetch at most `batch_size` documents with `status: "ingested"`
//! 3. decode and upsert each one, keyed on its `_id`
//! 4. mark it `processed` only once its row is durable
//!
//! Delivery is at-least-once; the `ON CONFLICT DO NOTHING` upsert makes
//! re-delivery harmless.

pub mod decode;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod scheduler;
pub mod schema;
pub mod service;
pub mod source;
pub mod target;
pub mod types;

pub use decode::{decode_document, DecodeWarning, DecodedDocument};
pub use error::{DocumentError, StoreError, SyncError};
pub use memory::{MemoryAnalyticsStore, MemoryDocumentStore};
pub use orchestrator::SyncOrchestrator;
pub use scheduler::SyncScheduler;
pub use schema::{validate_table_name, PgSchemaManager, SchemaManager, DEFAULT_ANALYTICS_TABLE};
pub use service::{SyncService, DEFAULT_SYNC_TIMEOUT};
pub use source::{DocumentSource, MongoDocumentSource};
pub use target::{AnalyticsWriter, PgAnalyticsWriter};
pub use types::{
    AnalyticsRecord, DocumentFailure, DocumentId, DocumentStatus, FailureStage, OutcomeStatus,
    PendingDocument, StoredRecord, SyncOutcome, SyncReport, UpsertOutcome, DEFAULT_BATCH_SIZE,
};
