//! Schema and metadata models
//!
//! Types returned by the `/v0/meta` endpoints: bases, tables, fields and
//! views, plus workspace and enterprise metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Airtable field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    SingleLineText,
    Email,
    Url,
    MultilineText,
    Number,
    Percent,
    Currency,
    SingleSelect,
    MultipleSelects,
    SingleCollaborator,
    MultipleCollaborators,
    MultipleRecordLinks,
    Date,
    DateTime,
    PhoneNumber,
    MultipleAttachments,
    Checkbox,
    Formula,
    CreatedTime,
    Rollup,
    Count,
    Lookup,
    MultipleLookupValues,
    AutoNumber,
    Barcode,
    Rating,
    RichText,
    Duration,
    LastModifiedTime,
    Button,
    CreatedBy,
    LastModifiedBy,
    ExternalSyncSource,
    AiText,
    /// A type this version of the library does not know about
    #[serde(other)]
    Unknown,
}

impl FieldType {
    /// Whether values of this type are computed by Airtable
    pub fn is_computed(&self) -> bool {
        matches!(
            self,
            FieldType::Formula
                | FieldType::CreatedTime
                | FieldType::Rollup
                | FieldType::Count
                | FieldType::Lookup
                | FieldType::MultipleLookupValues
                | FieldType::AutoNumber
                | FieldType::LastModifiedTime
                | FieldType::Button
                | FieldType::CreatedBy
                | FieldType::LastModifiedBy
                | FieldType::ExternalSyncSource
                | FieldType::AiText
        )
    }
}

/// A field of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Type-specific options (choices, precision, linked table...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

/// A view of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSchema {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub view_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_field_ids: Option<Vec<String>>,
}

/// A table and its fields and views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub id: String,
    pub name: String,
    pub primary_field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub views: Vec<ViewSchema>,
}

impl TableSchema {
    /// Find a field by id or name
    pub fn field(&self, id_or_name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.id == id_or_name)
            .or_else(|| self.fields.iter().find(|f| f.name == id_or_name))
    }

    /// Find a view by id or name
    pub fn view(&self, id_or_name: &str) -> Option<&ViewSchema> {
        self.views
            .iter()
            .find(|v| v.id == id_or_name)
            .or_else(|| self.views.iter().find(|v| v.name == id_or_name))
    }

    /// The primary field of the table
    pub fn primary_field(&self) -> Option<&FieldSchema> {
        self.field(&self.primary_field_id)
    }
}

/// All tables of a base
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseSchema {
    pub tables: Vec<TableSchema>,
}

impl BaseSchema {
    /// Find a table by id or name
    pub fn table(&self, id_or_name: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|t| t.id == id_or_name)
            .or_else(|| self.tables.iter().find(|t| t.name == id_or_name))
    }
}

/// A base visible to the token, from `/v0/meta/bases`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseInfo {
    pub id: String,
    pub name: String,
    pub permission_level: String,
}

/// Page of `/v0/meta/bases`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BasesPage {
    #[serde(default)]
    pub bases: Vec<BaseInfo>,
    #[serde(default)]
    pub offset: Option<String>,
}

/// A collaborator with a permission level on a base or workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorInfo {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub permission_level: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

/// Collaborator lists grouped by how access was granted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorLists {
    #[serde(default)]
    pub base_collaborators: Vec<CollaboratorInfo>,
    #[serde(default)]
    pub workspace_collaborators: Vec<CollaboratorInfo>,
}

/// Base metadata including collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseCollaborators {
    pub id: String,
    pub name: String,
    pub permission_level: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub individual_collaborators: CollaboratorLists,
    #[serde(default)]
    pub group_collaborators: CollaboratorLists,
}

/// A shared view or shared base link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseShare {
    pub share_id: String,
    #[serde(rename = "type")]
    pub share_type: String,
    pub state: String,
    #[serde(default)]
    pub created_by_user_id: Option<String>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_password_protected: bool,
    #[serde(default)]
    pub restricted_to_email_domains: Vec<String>,
    #[serde(default)]
    pub view_id: Option<String>,
}

/// Page of `/v0/meta/bases/{id}/shares`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SharesPage {
    #[serde(default)]
    pub shares: Vec<BaseShare>,
}

/// Workspace metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub base_ids: Vec<String>,
    #[serde(default)]
    pub individual_collaborators: CollaboratorLists,
    #[serde(default)]
    pub group_collaborators: CollaboratorLists,
}

/// Enterprise account metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseInfo {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub workspace_ids: Vec<String>,
    #[serde(default)]
    pub email_domains: Vec<Value>,
    #[serde(default)]
    pub root_enterprise_id: Option<String>,
}

/// An enterprise user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub is_sso_required: Option<bool>,
    #[serde(default)]
    pub is_two_factor_auth_enabled: Option<bool>,
    #[serde(default)]
    pub is_managed: Option<bool>,
    #[serde(default)]
    pub last_activity_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub enterprise_user_type: Option<String>,
}

/// Page of enterprise users
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UsersPage {
    #[serde(default)]
    pub users: Vec<UserInfo>,
}

/// A member of a user group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub role: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

/// An enterprise user group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub id: String,
    pub name: String,
    pub enterprise_account_id: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

/// One audit log event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(default)]
    pub actor: Value,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub payload_version: Option<String>,
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub origin: Value,
}

/// Cursor block of an audit log page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLogPagination {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// Page of audit log events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogResponse {
    #[serde(default)]
    pub events: Vec<AuditLogEvent>,
    #[serde(default)]
    pub pagination: Option<AuditLogPagination>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> BaseSchema {
        serde_json::from_value(json!({
            "tables": [{
                "id": "tblAAAAAAAAAAAAAA",
                "name": "Contacts",
                "primaryFieldId": "fldAAAAAAAAAAAAAA",
                "fields": [
                    {"id": "fldAAAAAAAAAAAAAA", "name": "Name", "type": "singleLineText"},
                    {"id": "fldBBBBBBBBBBBBBB", "name": "Age", "type": "number",
                     "options": {"precision": 0}},
                    {"id": "fldCCCCCCCCCCCCCC", "name": "Mood", "type": "somethingNew"}
                ],
                "views": [
                    {"id": "viwAAAAAAAAAAAAAA", "name": "Grid view", "type": "grid"}
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_schema_lookup() {
        let schema = sample_schema();
        let table = schema.table("Contacts").unwrap();
        assert_eq!(schema.table("tblAAAAAAAAAAAAAA").unwrap().name, "Contacts");
        assert!(schema.table("Missing").is_none());

        assert_eq!(table.primary_field().unwrap().name, "Name");
        assert_eq!(table.field("Age").unwrap().field_type, FieldType::Number);
        assert_eq!(table.view("Grid view").unwrap().view_type, "grid");
    }

    #[test]
    fn test_unknown_field_type() {
        let schema = sample_schema();
        let field = schema.tables[0].field("Mood").unwrap();
        assert_eq!(field.field_type, FieldType::Unknown);
    }

    #[test]
    fn test_field_type_wire_names() {
        assert_eq!(
            serde_json::to_value(FieldType::MultipleRecordLinks).unwrap(),
            json!("multipleRecordLinks")
        );
        assert_eq!(serde_json::to_value(FieldType::DateTime).unwrap(), json!("dateTime"));
        assert!(FieldType::AutoNumber.is_computed());
        assert!(!FieldType::SingleLineText.is_computed());
    }
}
