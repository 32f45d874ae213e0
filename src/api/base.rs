//! Base
//!
//! A base groups tables. This module covers base metadata, the cached schema,
//! table creation, webhooks, collaborators and shares.

use crate::api::params::TableSpec;
use crate::api::{Api, Table};
use crate::error::{AirtableError, Result};
use crate::models::schema::SharesPage;
use crate::models::webhook::WebhookList;
use crate::models::{
    BaseCollaborators, BaseInfo, BaseSchema, BaseShare, CreateWebhookResponse, TableSchema,
    Webhook, WebhookPayload, WebhookPayloads, WebhookSpecification,
};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A base, bound to an [`Api`]
#[derive(Clone, Debug)]
pub struct Base {
    api: Api,
    id: String,
    name: Option<String>,
    permission_level: Option<String>,
    /// Schema cache shared by clones and by tables of this base
    schema: Arc<RwLock<Option<BaseSchema>>>,
}

impl Base {
    /// Create a base handle (no request is made)
    pub fn new(api: Api, id: impl Into<String>) -> Self {
        Self {
            api,
            id: id.into(),
            name: None,
            permission_level: None,
            schema: Arc::new(RwLock::new(None)),
        }
    }

    pub(crate) fn from_info(api: Api, info: BaseInfo) -> Self {
        let mut base = Self::new(api, info.id);
        base.name = Some(info.name);
        base.permission_level = Some(info.permission_level);
        base
    }

    /// Base id (`app...`)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Base name, when known from a listing
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Permission level of the token on this base, when known from a listing
    pub fn permission_level(&self) -> Option<&str> {
        self.permission_level.as_deref()
    }

    /// The client this base is bound to
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Records URL of the base: `/v0/{base_id}`
    pub fn url(&self) -> Result<reqwest::Url> {
        self.api.build_url([self.id.as_str()])
    }

    /// Metadata URL: `/v0/meta/bases/{base_id}/...`
    pub fn meta_url<I, S>(&self, segments: I) -> Result<reqwest::Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = vec!["meta".to_string(), "bases".to_string(), self.id.clone()];
        path.extend(segments.into_iter().map(|s| s.as_ref().to_string()));
        self.api.build_url(path)
    }

    fn webhooks_url<I, S>(&self, segments: I) -> Result<reqwest::Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = vec!["bases".to_string(), self.id.clone(), "webhooks".to_string()];
        path.extend(segments.into_iter().map(|s| s.as_ref().to_string()));
        self.api.build_url(path)
    }

    /// A table of this base by id or name (no request is made)
    pub fn table(&self, id_or_name: impl Into<String>) -> Table {
        Table::new(self.clone(), id_or_name)
    }

    /// The schema of the base, fetched once and then cached
    pub async fn schema(&self) -> Result<BaseSchema> {
        if let Some(schema) = self.schema.read().await.as_ref() {
            return Ok(schema.clone());
        }
        self.schema_refresh().await
    }

    /// Fetch the schema again, replacing the cached copy
    pub async fn schema_refresh(&self) -> Result<BaseSchema> {
        let url = self.meta_url(["tables"])?;
        let schema: BaseSchema = self.api.request(Method::GET, url, None).await?;
        tracing::debug!(base_id = %self.id, tables = schema.tables.len(), "fetched base schema");
        *self.schema.write().await = Some(schema.clone());
        Ok(schema)
    }

    /// Drop the cached schema so the next call refetches it
    pub async fn invalidate_schema(&self) {
        *self.schema.write().await = None;
    }

    pub(crate) async fn set_cached_schema(&self, tables: Vec<TableSchema>) {
        if !tables.is_empty() {
            *self.schema.write().await = Some(BaseSchema { tables });
        }
    }

    /// All tables of the base
    pub async fn tables(&self) -> Result<Vec<Table>> {
        let schema = self.schema().await?;
        Ok(schema.tables.iter().map(|t| self.table(t.id.clone())).collect())
    }

    /// Create a table
    pub async fn create_table(&self, spec: &TableSpec) -> Result<Table> {
        if spec.fields.is_empty() {
            return Err(AirtableError::InvalidParameter(
                "a new table needs at least one field".to_string(),
            ));
        }
        let url = self.meta_url(["tables"])?;
        let body = serde_json::to_value(spec)?;
        let created: TableSchema = self.api.request(Method::POST, url, Some(body)).await?;
        tracing::info!(base_id = %self.id, table_id = %created.id, "created table");

        self.invalidate_schema().await;
        Ok(self.table(created.id))
    }

    /// Id, name and permission level of the base
    pub async fn info(&self) -> Result<BaseInfo> {
        let url = self.meta_url(Vec::<String>::new())?;
        let meta: BaseCollaborators = self.api.request(Method::GET, url, None).await?;
        Ok(BaseInfo {
            id: meta.id,
            name: meta.name,
            permission_level: meta.permission_level,
        })
    }

    /// Base metadata with its collaborators
    pub async fn collaborators(&self) -> Result<BaseCollaborators> {
        let mut url = self.meta_url(Vec::<String>::new())?;
        url.query_pairs_mut()
            .append_pair("include", "collaborators")
            .append_pair("include", "inviteLinks")
            .append_pair("include", "interfaces");
        self.api.request(Method::GET, url, None).await
    }

    /// Shared links of the base
    pub async fn shares(&self) -> Result<Vec<BaseShare>> {
        let url = self.meta_url(["shares"])?;
        let page: SharesPage = self.api.request(Method::GET, url, None).await?;
        Ok(page.shares)
    }

    /// Delete the base
    pub async fn delete(&self) -> Result<()> {
        let url = self.meta_url(Vec::<String>::new())?;
        let _: Value = self.api.request(Method::DELETE, url, None).await?;
        tracing::info!(base_id = %self.id, "deleted base");
        Ok(())
    }

    /// Webhooks registered on the base
    pub async fn webhooks(&self) -> Result<Vec<Webhook>> {
        let url = self.webhooks_url(Vec::<String>::new())?;
        let list: WebhookList = self.api.request(Method::GET, url, None).await?;
        Ok(list.webhooks)
    }

    /// One webhook by id
    pub async fn webhook(&self, webhook_id: &str) -> Result<Webhook> {
        self.webhooks()
            .await?
            .into_iter()
            .find(|w| w.id == webhook_id)
            .ok_or_else(|| AirtableError::NotFound(format!("webhook {}", webhook_id)))
    }

    /// Register a webhook
    ///
    /// The returned `mac_secret_base64` is needed to validate notifications
    /// and cannot be retrieved later.
    pub async fn add_webhook(
        &self,
        notification_url: &str,
        spec: &WebhookSpecification,
    ) -> Result<CreateWebhookResponse> {
        let url = self.webhooks_url(Vec::<String>::new())?;
        let body = json!({
            "notificationUrl": notification_url,
            "specification": spec,
        });
        let created: CreateWebhookResponse = self.api.request(Method::POST, url, Some(body)).await?;
        tracing::info!(base_id = %self.id, webhook_id = %created.id, "created webhook");
        Ok(created)
    }

    /// Delete a webhook
    pub async fn delete_webhook(&self, webhook_id: &str) -> Result<()> {
        let url = self.webhooks_url([webhook_id])?;
        let _: Value = self.api.request(Method::DELETE, url, None).await?;
        Ok(())
    }

    /// Turn notification pings on or off for a webhook
    pub async fn enable_webhook_notifications(&self, webhook_id: &str, enable: bool) -> Result<()> {
        let url = self.webhooks_url([webhook_id, "enableNotifications"])?;
        let _: Value = self
            .api
            .request(Method::POST, url, Some(json!({ "enable": enable })))
            .await?;
        Ok(())
    }

    /// Extend a webhook's expiration by seven days
    pub async fn refresh_webhook(&self, webhook_id: &str) -> Result<Option<DateTime<Utc>>> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Refreshed {
            expiration_time: Option<DateTime<Utc>>,
        }

        let url = self.webhooks_url([webhook_id, "refresh"])?;
        let refreshed: Refreshed = self.api.request(Method::POST, url, None).await?;
        Ok(refreshed.expiration_time)
    }

    /// Iterate a webhook's payloads starting at `cursor` (1 is the oldest)
    pub fn webhook_payloads(
        &self,
        webhook_id: &str,
        cursor: Option<u64>,
        limit: Option<u32>,
    ) -> WebhookPayloadCursor {
        WebhookPayloadCursor {
            base: self.clone(),
            webhook_id: webhook_id.to_string(),
            cursor: cursor.unwrap_or(1),
            limit,
            done: false,
        }
    }
}

/// Cursor over the payloads of a webhook
///
/// Follows `cursor` while the API reports `mightHaveMore`.
pub struct WebhookPayloadCursor {
    base: Base,
    webhook_id: String,
    cursor: u64,
    limit: Option<u32>,
    done: bool,
}

impl WebhookPayloadCursor {
    /// Cursor to use for the next request
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Fetch the next page of payloads, or `None` once caught up
    pub async fn next_page(&mut self) -> Result<Option<Vec<WebhookPayload>>> {
        if self.done {
            return Ok(None);
        }

        let mut url = self.base.webhooks_url([self.webhook_id.as_str(), "payloads"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("cursor", &self.cursor.to_string());
            if let Some(limit) = self.limit {
                query.append_pair("limit", &limit.to_string());
            }
        }

        let page: WebhookPayloads = self.base.api.request(Method::GET, url, None).await?;
        let start = self.cursor;
        let payloads = page
            .payloads
            .into_iter()
            .enumerate()
            .map(|(i, mut payload)| {
                payload.cursor = Some(start + i as u64);
                payload
            })
            .collect();

        self.cursor = page.cursor;
        self.done = !page.might_have_more;
        Ok(Some(payloads))
    }

    /// Fetch every remaining payload
    pub async fn collect_all(mut self) -> Result<Vec<WebhookPayload>> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }
}
