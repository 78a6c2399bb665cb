//! Reading ETL Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the reading ETL workspace members.
//!
//! - **Error Handling**: the [`EtlError`] type and [`Result`] alias
//! - **Environment**: typed helpers for reading `KEY=value` configuration
//! - **Logging**: `tracing` subscriber setup driven by `LOG_*` variables
//!
//! # Example
//!
//! ```no_run
//! use reading_etl_common::env;
//! use reading_etl_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     let batch_size = env::positive_or("BATCH_SIZE", 100);
//!     tracing::info!(batch_size, "configured");
//!     Ok(())
//! }
//! ```

pub mod env;
pub mod error;
pub mod logging;

pub use error::{EtlError, Result};
