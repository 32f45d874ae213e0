//! Airtable data models
//!
//! Serde types for records and the other resources returned by the API.
//! Wire names are camelCase; unknown keys are ignored so newer API responses
//! keep deserializing.

pub mod comment;
pub mod schema;
pub mod webhook;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Re-exports
pub use comment::{Comment, Mentioned};
pub use schema::{
    AuditLogEvent, AuditLogResponse, BaseCollaborators, BaseInfo, BaseSchema, BaseShare,
    EnterpriseInfo, FieldSchema, FieldType, TableSchema, UserGroup, UserInfo, ViewSchema,
    WorkspaceInfo,
};
pub use webhook::{
    CreateWebhookResponse, Webhook, WebhookNotification, WebhookPayload, WebhookPayloads,
    WebhookSpecification,
};

/// Cell values of a record, keyed by field name (or field id)
pub type Fields = Map<String, Value>;

/// A record as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDict {
    /// Record id (`rec...`)
    pub id: String,
    /// Creation timestamp
    pub created_time: DateTime<Utc>,
    /// Cell values; empty cells are omitted by Airtable
    #[serde(default)]
    pub fields: Fields,
    /// Number of comments, when requested with `recordMetadata`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
}

/// Payload for creating a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRecordDict {
    pub fields: Fields,
}

/// Payload for updating a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecordDict {
    pub id: String,
    pub fields: Fields,
}

/// Response to a record deletion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDeletedDict {
    pub id: String,
    pub deleted: bool,
}

/// Response to an upsert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResultDict {
    /// Ids of records that were created
    #[serde(default)]
    pub created_records: Vec<String>,
    /// Ids of records that already existed and were updated
    #[serde(default)]
    pub updated_records: Vec<String>,
    /// All affected records, in request order
    #[serde(default)]
    pub records: Vec<RecordDict>,
}

/// Identity of the token owner, from `/v0/meta/whoami`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAndScopesInfo {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

/// A user reference as it appears in collaborator cells and comments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Thumbnail of an image attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// An attachment cell value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentDict {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<std::collections::BTreeMap<String, Thumbnail>>,
}

/// Response of the attachment upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAttachmentResult {
    pub id: String,
    pub created_time: DateTime<Utc>,
    /// Field id to the resulting attachment list
    #[serde(default)]
    pub fields: std::collections::BTreeMap<String, Vec<AttachmentDict>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_deserialization() {
        let record: RecordDict = serde_json::from_value(json!({
            "id": "recAAAAAAAAAAAAAA",
            "createdTime": "2023-05-22T21:24:15.000Z",
            "fields": {"Name": "Alice", "Age": 30}
        }))
        .unwrap();

        assert_eq!(record.id, "recAAAAAAAAAAAAAA");
        assert_eq!(record.fields["Name"], json!("Alice"));
        assert!(record.comment_count.is_none());
    }

    #[test]
    fn test_record_without_fields() {
        let record: RecordDict = serde_json::from_value(json!({
            "id": "recAAAAAAAAAAAAAA",
            "createdTime": "2023-05-22T21:24:15.000Z",
            "commentCount": 2
        }))
        .unwrap();
        assert!(record.fields.is_empty());
        assert_eq!(record.comment_count, Some(2));
    }

    #[test]
    fn test_attachment_serialization() {
        let attachment = AttachmentDict {
            url: "https://example.com/a.png".to_string(),
            content_type: Some("image/png".to_string()),
            ..AttachmentDict::default()
        };
        let value = serde_json::to_value(&attachment).unwrap();
        assert_eq!(
            value,
            json!({"url": "https://example.com/a.png", "type": "image/png"})
        );
    }

    #[test]
    fn test_upsert_result() {
        let result: UpsertResultDict = serde_json::from_value(json!({
            "createdRecords": ["recA"],
            "updatedRecords": [],
            "records": []
        }))
        .unwrap();
        assert_eq!(result.created_records, vec!["recA".to_string()]);
    }
}
