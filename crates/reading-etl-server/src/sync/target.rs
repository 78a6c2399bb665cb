//! Analytics table writer

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use super::{
    error::StoreError,
    types::{AnalyticsRecord, StoredRecord, UpsertOutcome},
};

/// Idempotent writer keyed on `mongo_id`; the first write wins
#[async_trait]
pub trait AnalyticsWriter: Send + Sync {
    async fn upsert(&self, record: &AnalyticsRecord) -> Result<UpsertOutcome, StoreError>;
}

pub struct PgAnalyticsWriter {
    pool: PgPool,
    table: String,
}

impl PgAnalyticsWriter {
    /// `table` must already have passed
    /// [`validate_table_name`](super::schema::validate_table_name).
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    pub async fn find_record(&self, mongo_id: &str) -> Result<Option<StoredRecord>, StoreError> {
        let sql = format!(
            "SELECT id, mongo_id, event_timestamp, source, event_type, payload, meta, created_at \
             FROM {} WHERE mongo_id = $1",
            self.table
        );
        let record = sqlx::query_as::<_, StoredRecord>(&sql)
            .bind(mongo_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    pub async fn count_records(&self) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

#[async_trait]
impl AnalyticsWriter for PgAnalyticsWriter {
    async fn upsert(&self, record: &AnalyticsRecord) -> Result<UpsertOutcome, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {} (mongo_id, event_timestamp, source, event_type, payload, meta)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (mongo_id) DO NOTHING
            "#,
            self.table
        );

        let result = sqlx::query(&sql)
            .bind(&record.mongo_id)
            .bind(record.event_timestamp)
            .bind(&record.source)
            .bind(&record.event_type)
            .bind(Json(&record.payload))
            .bind(Json(&record.meta))
            .execute(&self.pool)
            .await?;

        Ok(if result.rows_affected() == 0 {
            UpsertOutcome::AlreadyPresent
        } else {
            UpsertOutcome::Inserted
        })
    }
}
