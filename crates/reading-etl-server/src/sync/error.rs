//! Error types for the reading sync
//!
//! Only [`SyncError`] ever escapes a cycle. [`DocumentError`] is absorbed into
//! the cycle's [`SyncReport`](super::types::SyncReport), and decode problems are
//! reported as [`DecodeWarning`](super::decode::DecodeWarning)s.

use std::time::Duration;
use thiserror::Error;

use super::types::{DocumentFailure, FailureStage};

/// Failure reported by a store behind one of the sync traits
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("document {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),
}

/// Fatal to a cycle; no document is touched once one of these occurs
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to ensure analytics schema: {0}")]
    Schema(#[source] StoreError),

    #[error("failed to query pending documents: {0}")]
    SourceQuery(#[source] StoreError),

    #[error("sync cycle timed out after {0:?}")]
    Timeout(Duration),
}

/// Per-document failure; the document stays eligible for the next cycle
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to write analytics record {mongo_id}: {source}")]
    Write {
        mongo_id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to acknowledge document {mongo_id}: {source}")]
    Acknowledge {
        mongo_id: String,
        #[source]
        source: StoreError,
    },
}

impl DocumentError {
    pub fn stage(&self) -> FailureStage {
        match self {
            DocumentError::Write { .. } => FailureStage::Write,
            DocumentError::Acknowledge { .. } => FailureStage::Acknowledge,
        }
    }

    pub fn mongo_id(&self) -> &str {
        match self {
            DocumentError::Write { mongo_id, .. } | DocumentError::Acknowledge { mongo_id, .. } => {
                mongo_id
            },
        }
    }

    pub fn to_failure(&self) -> DocumentFailure {
        let source = match self {
            DocumentError::Write { source, .. } | DocumentError::Acknowledge { source, .. } => {
                source
            },
        };

        DocumentFailure {
            mongo_id: self.mongo_id().to_string(),
            stage: self.stage(),
            message: source.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_document_error_to_failure() {
        let err = DocumentError::Acknowledge {
            mongo_id: "abc".to_string(),
            source: StoreError::NotFound("abc".to_string()),
        };

        let failure = err.to_failure();
        assert_eq!(failure.mongo_id, "abc");
        assert_eq!(failure.stage, FailureStage::Acknowledge);
        assert_eq!(failure.message, "document abc not found");
    }

    #[test]
    fn test_sync_error_messages() {
        let err = SyncError::Schema(StoreError::Unavailable("db connection lost".to_string()));
        assert_eq!(
            err.to_string(),
            "failed to ensure analytics schema: db connection lost"
        );

        let err = SyncError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "sync cycle timed out after 5s");
    }
}
