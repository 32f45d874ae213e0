//! Airtable REST API
//!
//! [`Api`] hands out [`Base`], [`Table`], [`Workspace`] and [`Enterprise`]
//! handles; each maps its operations onto HTTP calls through the shared
//! [`crate::http::HttpClient`].

pub mod base;
pub mod client;
pub mod enterprise;
pub mod pagination;
pub mod params;
pub mod table;
pub mod workspace;

// Re-exports
pub use base::{Base, WebhookPayloadCursor};
pub use client::{
    Api, ApiBuilder, DEFAULT_CONTENT_URL, DEFAULT_ENDPOINT_URL, MAX_RECORDS_PER_REQUEST,
    MAX_URL_LENGTH,
};
pub use enterprise::{AuditLogCursor, AuditLogQuery, Enterprise};
pub use pagination::{OffsetPage, Paginator, RecordPage};
pub use params::{CellFormat, Direction, FieldSpec, RecordQuery, SortField, TableSpec};
pub use table::{RecordPages, Table};
pub use workspace::Workspace;
