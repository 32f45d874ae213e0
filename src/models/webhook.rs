//! Webhook models
//!
//! Webhook configuration, the payloads Airtable accumulates for each webhook,
//! and validation of the notification pings sent to `notificationUrl`.

use crate::error::{AirtableError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the `X-Airtable-Content-MAC` header value
const MAC_PREFIX: &str = "hmac-sha256=";

/// Which changes a webhook watches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookFilters {
    /// `tableData`, `tableFields` and/or `tableMetadata`
    pub data_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_change_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_data_in_field_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_schemas_of_field_ids: Option<Vec<String>>,
}

/// Extra data included in payloads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookIncludes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_cell_values_in_field_ids: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_previous_cell_values: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_previous_field_definitions: Option<bool>,
}

/// Options block of a webhook specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookOptions {
    pub filters: WebhookFilters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<WebhookIncludes>,
}

/// Specification sent when creating a webhook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookSpecification {
    pub options: WebhookOptions,
}

impl WebhookSpecification {
    /// Watch the given data types across the whole base
    pub fn data_types(types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            options: WebhookOptions {
                filters: WebhookFilters {
                    data_types: types.into_iter().map(Into::into).collect(),
                    ..WebhookFilters::default()
                },
                includes: None,
            },
        }
    }

    /// Restrict the webhook to one table or view
    pub fn with_record_change_scope(mut self, scope: impl Into<String>) -> Self {
        self.options.filters.record_change_scope = Some(scope.into());
        self
    }
}

/// Outcome of the most recent notification attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookNotificationResult {
    pub success: bool,
    #[serde(default)]
    pub completion_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub retry_number: Option<u32>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub will_be_retried: Option<bool>,
}

/// A webhook registered on a base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: String,
    pub are_notifications_enabled: bool,
    pub cursor_for_next_payload: u64,
    pub is_hook_enabled: bool,
    #[serde(default)]
    pub notification_url: Option<String>,
    #[serde(default)]
    pub expiration_time: Option<DateTime<Utc>>,
    pub specification: WebhookSpecification,
    #[serde(default)]
    pub last_successful_notification_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_notification_result: Option<WebhookNotificationResult>,
}

/// Response to webhook creation
///
/// `mac_secret_base64` is only returned once; keep it to validate
/// notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebhookResponse {
    pub id: String,
    pub mac_secret_base64: String,
    #[serde(default)]
    pub expiration_time: Option<DateTime<Utc>>,
}

/// List of webhooks on a base
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WebhookList {
    #[serde(default)]
    pub webhooks: Vec<Webhook>,
}

/// One batch of changes delivered to a webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub timestamp: DateTime<Utc>,
    pub base_transaction_number: u64,
    pub payload_format: String,
    #[serde(default)]
    pub action_metadata: Option<Value>,
    #[serde(default)]
    pub changed_tables_by_id: Option<Map<String, Value>>,
    #[serde(default)]
    pub created_tables_by_id: Option<Map<String, Value>>,
    #[serde(default)]
    pub destroyed_table_ids: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<bool>,
    #[serde(default)]
    pub code: Option<String>,
    /// Cursor of this payload, filled in while paging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<u64>,
}

/// One page of webhook payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayloads {
    #[serde(default)]
    pub payloads: Vec<WebhookPayload>,
    /// Cursor to pass to fetch the next page
    pub cursor: u64,
    pub might_have_more: bool,
}

/// Reference to an object by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: String,
}

/// The ping Airtable posts to `notificationUrl`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookNotification {
    pub base: IdRef,
    pub webhook: IdRef,
    pub timestamp: DateTime<Utc>,
}

impl WebhookNotification {
    /// Validate and parse an incoming notification
    ///
    /// # Arguments
    /// * `body` - Raw request body
    /// * `header` - Value of the `X-Airtable-Content-MAC` header
    /// * `secret_base64` - `mac_secret_base64` from webhook creation
    pub fn from_request(body: &str, header: &str, secret_base64: &str) -> Result<Self> {
        let expected = header
            .trim()
            .strip_prefix(MAC_PREFIX)
            .and_then(|hex_mac| hex::decode(hex_mac).ok())
            .ok_or(AirtableError::InvalidSignature)?;

        let mut mac = Self::mac(secret_base64)?;
        mac.update(body.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| AirtableError::InvalidSignature)?;

        Ok(serde_json::from_str(body)?)
    }

    /// Compute the `X-Airtable-Content-MAC` header value for a body
    pub fn signature(body: &str, secret_base64: &str) -> Result<String> {
        let mut mac = Self::mac(secret_base64)?;
        mac.update(body.as_bytes());
        Ok(format!(
            "{}{}",
            MAC_PREFIX,
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    fn mac(secret_base64: &str) -> Result<HmacSha256> {
        let secret = BASE64.decode(secret_base64.trim()).map_err(|e| {
            AirtableError::InvalidParameter(format!("webhook secret is not base64: {}", e))
        })?;
        HmacSha256::new_from_slice(&secret)
            .map_err(|e| AirtableError::InvalidParameter(format!("invalid webhook secret: {}", e)))
    }
}
