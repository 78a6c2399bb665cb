//! Reading ETL Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Moves staged reading events from MongoDB into a PostgreSQL analytics table.
//!
//! # Overview
//!
//! - **Sync**: the batch cycle, its store traits and their implementations
//! - **API**: HTTP trigger plus auxiliary routes
//! - **Configuration**: environment-based configuration management
//! - **Middleware**: request logging
//!
//! # Delivery guarantees
//!
//! A document is marked `processed` only after its analytics row is written.
//! A crash or failed acknowledgement in between leaves it `ingested`, so the
//! next cycle writes it again; the upsert ignores the duplicate and the
//! acknowledgement is retried. Delivery is at-least-once and convergent.
//!
//! # Example
//!
//! ```no_run
//! use reading_etl_server::{app, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let stores = app::Stores::connect(&config).await?;
//!     let outcome = app::sync_service(&config, &stores, None).trigger().await;
//!     println!("{}", serde_json::to_string(&outcome)?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod sync;

// Re-export commonly used types
pub use error::AppError;
