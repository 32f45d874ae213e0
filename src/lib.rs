//! airtable-kit
//!
//! Async client for the Airtable REST API: typed records and metadata,
//! offset pagination, a formula builder, configurable retries, an ORM layer
//! and testing helpers. The `airtable-kit` binary is in src/main.rs.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod formulas;
pub mod http;
pub mod models;
pub mod orm;
pub mod testing;
pub mod utils;

// Re-exports
pub use api::{Api, Base, Enterprise, RecordQuery, Table, Workspace};
pub use error::{AirtableError, Result};
pub use http::{retry_strategy, RetryStrategy};
