//! Analytics table bootstrap

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::error::StoreError;

/// Table written to when `ANALYTICS_TABLE` is unset
pub const DEFAULT_ANALYTICS_TABLE: &str = "reading_analytics";

/// Makes sure the analytics table exists before a cycle touches any document
#[async_trait]
pub trait SchemaManager: Send + Sync {
    /// Create the table if absent. Safe to call on every cycle.
    async fn ensure_schema(&self) -> Result<(), StoreError>;
}

/// Accept only plain SQL identifiers (`[A-Za-z_][A-Za-z0-9_]*`, at most 63 bytes).
///
/// The table name is interpolated into DDL and DML, so anything else is rejected.
pub fn validate_table_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid table name {name:?}"));
    }
    if name.len() > 63 {
        return Err(format!("table name {name:?} exceeds 63 characters"));
    }
    Ok(())
}

pub fn create_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id SERIAL PRIMARY KEY,
            mongo_id TEXT UNIQUE NOT NULL,
            event_timestamp TIMESTAMPTZ,
            source TEXT,
            event_type TEXT,
            payload JSONB,
            meta JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#
    )
}

pub struct PgSchemaManager {
    pool: PgPool,
    table: String,
}

impl PgSchemaManager {
    /// `table` must already have passed [`validate_table_name`].
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl SchemaManager for PgSchemaManager {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(&create_table_sql(&self.table))
            .execute(&self.pool)
            .await?;

        debug!(table = %self.table, "Analytics table ensured");
        Ok(())
    }
}
