//! Wiring between configuration, stores and the sync service

use anyhow::Context;
use mongodb::Client;
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    config::Config,
    db,
    sync::{MongoDocumentSource, PgAnalyticsWriter, PgSchemaManager, SyncOrchestrator, SyncService},
};

/// Live handles to both stores
#[derive(Clone)]
pub struct Stores {
    pub db: PgPool,
    pub mongo: Client,
}

impl Stores {
    /// Connect to and ping PostgreSQL and MongoDB.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let db = db::connect_postgres(&config.database)
            .await
            .context("Failed to connect to PostgreSQL")?;
        let mongo = db::connect_mongo(&config.mongo)
            .await
            .context("Failed to connect to MongoDB")?;

        Ok(Self { db, mongo })
    }
}

/// Assemble the PostgreSQL/MongoDB backed service.
///
/// `batch_size` overrides the configured value when set.
pub fn sync_service(config: &Config, stores: &Stores, batch_size: Option<usize>) -> SyncService {
    let table = config.sync.table.clone();
    let orchestrator = SyncOrchestrator::new(
        Arc::new(PgSchemaManager::new(stores.db.clone(), table.clone())),
        Arc::new(MongoDocumentSource::from_client(
            &stores.mongo,
            &config.mongo.database,
            &config.mongo.collection,
        )),
        Arc::new(PgAnalyticsWriter::new(stores.db.clone(), table)),
    )
    .with_batch_size(batch_size.unwrap_or(config.sync.batch_size));

    SyncService::new(orchestrator, config.sync.timeout())
}
