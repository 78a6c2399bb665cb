//! Configuration management
//!
//! Everything comes from the process environment, optionally seeded from a
//! `.env` file in the working directory or its parent.

use reading_etl_common::{env, EtlError, Result};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::str::FromStr;
use std::time::Duration;

use crate::sync::{validate_table_name, DEFAULT_ANALYTICS_TABLE, DEFAULT_BATCH_SIZE};

// ============================================================================
// Defaults
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8085;

/// Default PostgreSQL port when assembling the connection from parts.
pub const DEFAULT_DATABASE_PORT: u16 = 5432;

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default budget for a single sync cycle in seconds.
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 300;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub mongo: MongoConfig,
    pub sync: SyncConfig,
}

/// HTTP bind address
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// PostgreSQL connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub connection: DatabaseConnection,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

/// A full URL wins over individual parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConnection {
    Url(String),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: Option<String>,
        name: String,
    },
}

/// Where pending documents live
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub batch_size: usize,
    pub table: String,
    /// `None` disables the interval trigger
    pub interval_secs: Option<u64>,
    pub timeout_secs: u64,
}

impl SyncConfig {
    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs.map(Duration::from_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load `.env` files, then read and validate the environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        dotenvy::from_filename("../.env").ok();

        Ok(Self::from_env()?)
    }

    /// Read the configuration from the process environment only.
    ///
    /// Every missing required key is reported in one [`EtlError::MissingEnv`].
    pub fn from_env() -> Result<Self> {
        let mut required = env::RequiredVars::new();

        let mongo = MongoConfig {
            uri: required.require("MONGO_URI"),
            database: required.require("MONGO_DB_NAME"),
            collection: required.require("MONGO_COLLECTION"),
        };

        let connection = match env::var("DATABASE_URL") {
            Some(url) => DatabaseConnection::Url(url),
            None => DatabaseConnection::Parts {
                host: required.require("DB_HOST"),
                port: env::parse_strict("DB_PORT")?.unwrap_or(DEFAULT_DATABASE_PORT),
                user: required.require("DB_USER"),
                password: env::var("DB_PASSWORD").or_else(|| env::var("SERVER_DB_PASSWORD")),
                name: required.require("DB_NAME"),
            },
        };

        required.finish()?;

        let timeout_secs = match env::parse_or("SYNC_TIMEOUT_SECS", DEFAULT_SYNC_TIMEOUT_SECS) {
            0 => DEFAULT_SYNC_TIMEOUT_SECS,
            secs => secs,
        };

        let config = Config {
            server: ServerConfig {
                host: env::var_or("HOST", DEFAULT_SERVER_HOST),
                port: env::parse_strict("PORT")?.unwrap_or(DEFAULT_SERVER_PORT),
            },
            database: DatabaseConfig {
                connection,
                max_connections: env::parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                connect_timeout_secs: env::parse_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
            },
            mongo,
            sync: SyncConfig {
                batch_size: env::positive_or("BATCH_SIZE", DEFAULT_BATCH_SIZE),
                table: env::var_or("ANALYTICS_TABLE", DEFAULT_ANALYTICS_TABLE),
                interval_secs: Some(env::parse_or::<u64>("SYNC_INTERVAL_SECS", 0))
                    .filter(|secs| *secs > 0),
                timeout_secs,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(EtlError::Config("Server port must be greater than 0".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(EtlError::Config(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }

        if let DatabaseConnection::Parts { port: 0, .. } = self.database.connection {
            return Err(EtlError::Config("DB_PORT must be greater than 0".to_string()));
        }

        if !self.mongo.uri.starts_with("mongodb://") && !self.mongo.uri.starts_with("mongodb+srv://")
        {
            return Err(EtlError::Config(format!(
                "MONGO_URI must start with mongodb:// or mongodb+srv://, got {:?}",
                self.mongo.uri
            )));
        }

        if self.sync.batch_size == 0 {
            return Err(EtlError::Config("Batch size must be greater than 0".to_string()));
        }

        validate_table_name(&self.sync.table).map_err(EtlError::Config)?;

        Ok(())
    }
}

impl DatabaseConfig {
    /// Connection options for the pool.
    ///
    /// Parts connect without TLS and pin the session time zone to UTC.
    pub fn connect_options(&self) -> std::result::Result<PgConnectOptions, sqlx::Error> {
        match &self.connection {
            DatabaseConnection::Url(url) => PgConnectOptions::from_str(url),
            DatabaseConnection::Parts {
                host,
                port,
                user,
                password,
                name,
            } => {
                let mut options = PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(user)
                    .database(name)
                    .ssl_mode(PgSslMode::Disable)
                    .options([("timezone", "UTC")]);
                if let Some(password) = password {
                    options = options.password(password);
                }
                Ok(options)
            },
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
            },
            database: DatabaseConfig {
                connection: DatabaseConnection::Url(
                    "postgresql://postgres@localhost:5432/observability".to_string(),
                ),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
            mongo: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "observability".to_string(),
                collection: "readings".to_string(),
            },
            sync: SyncConfig {
                batch_size: DEFAULT_BATCH_SIZE,
                table: DEFAULT_ANALYTICS_TABLE.to_string(),
                interval_secs: None,
                timeout_secs: DEFAULT_SYNC_TIMEOUT_SECS,
            },
        }
    }
}
