//! Store connections
//!
//! Both stores are pinged once at startup so a bad URI fails fast instead of
//! on the first sync cycle.

use mongodb::{bson::doc, options::ClientOptions, Client};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

use crate::config::{DatabaseConfig, MongoConfig};

/// Budget for the MongoDB liveness ping and server selection
pub const MONGO_PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    #[error("PostgreSQL unavailable: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("MongoDB unavailable: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("{0} did not answer a ping in time")]
    Timeout(&'static str),
}

pub type DbResult<T> = Result<T, DbError>;

pub async fn connect_postgres(config: &DatabaseConfig) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout())
        .connect_with(config.connect_options()?)
        .await?;

    health_check(&pool).await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> DbResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(DbError::from)
}

pub async fn connect_mongo(config: &MongoConfig) -> DbResult<Client> {
    let mut options = ClientOptions::parse(config.uri.as_str()).await?;
    options.app_name = Some("reading-etl".to_string());
    options.server_selection_timeout = Some(MONGO_PING_TIMEOUT);

    let client = Client::with_options(options)?;
    ping_mongo(&client).await?;

    tracing::info!(
        database = %config.database,
        collection = %config.collection,
        "MongoDB client connected"
    );

    Ok(client)
}

pub async fn ping_mongo(client: &Client) -> DbResult<()> {
    let admin = client.database("admin");
    let ping = admin.run_command(doc! { "ping": 1 });

    tokio::time::timeout(MONGO_PING_TIMEOUT, ping)
        .await
        .map_err(|_| DbError::Timeout("mongodb"))??;

    Ok(())
}
