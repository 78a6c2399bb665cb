//! Pending-document source
//!
//! Documents are staged in a MongoDB collection with `status: "ingested"` and
//! flipped to `"processed"` one at a time once their analytics row is durable.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document, RawDocumentBuf},
    Client, Collection,
};
use tracing::{debug, warn};

use super::{
    error::StoreError,
    types::{DocumentId, DocumentStatus, PendingDocument},
};

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Up to `limit` documents still in `ingested` state, in store order.
    async fn fetch_batch(&self, limit: usize) -> Result<Vec<PendingDocument>, StoreError>;

    /// Mark one document `processed`. Fails when no document matches `id`.
    async fn acknowledge(&self, id: &DocumentId) -> Result<(), StoreError>;
}

/// Reads raw BSON so one undecodable document cannot fail the whole cursor
pub struct MongoDocumentSource {
    collection: Collection<RawDocumentBuf>,
}

impl MongoDocumentSource {
    pub fn new(collection: Collection<Document>) -> Self {
        Self {
            collection: collection.clone_with_type(),
        }
    }

    pub fn from_client(client: &Client, database: &str, collection: &str) -> Self {
        Self::new(client.database(database).collection(collection))
    }
}

/// Convert one fetched document, replacing invalid UTF-8 when strict decoding fails.
///
/// `None` means the bytes could not be read at all.
pub fn document_from_raw(raw: &RawDocumentBuf) -> Option<Document> {
    match raw.to_document() {
        Ok(document) => Some(document),
        Err(strict) => match Document::from_reader_utf8_lossy(raw.as_bytes()) {
            Ok(document) => {
                warn!(error = %strict, "Decoded pending document with invalid UTF-8 replaced");
                Some(document)
            },
            Err(error) => {
                warn!(error = %error, "Failed to decode pending document");
                None
            },
        },
    }
}

#[async_trait]
impl DocumentSource for MongoDocumentSource {
    async fn fetch_batch(&self, limit: usize) -> Result<Vec<PendingDocument>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let filter = doc! { "status": DocumentStatus::Ingested.as_str() };
        let mut cursor = self
            .collection
            .find(filter)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?;

        let mut batch = Vec::with_capacity(limit.min(1024));
        while let Some(raw) = cursor.try_next().await? {
            let Some(body) = document_from_raw(&raw) else {
                continue;
            };
            match PendingDocument::from_document(body) {
                Some(pending) => batch.push(pending),
                None => warn!("Skipping pending document without _id"),
            }
            if batch.len() == limit {
                break;
            }
        }

        debug!(fetched = batch.len(), limit, "Fetched pending documents");
        Ok(batch)
    }

    async fn acknowledge(&self, id: &DocumentId) -> Result<(), StoreError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.as_bson().clone() },
                doc! { "$set": { "status": DocumentStatus::Processed.as_str() } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(id.key()));
        }
        Ok(())
    }
}
