//! Api client
//!
//! [`Api`] is the entry point: it holds the access token, endpoint, retry
//! strategy and transport, and hands out [`Base`], [`Table`], [`Workspace`]
//! and [`Enterprise`] objects bound to it.

use crate::api::pagination::Paginator;
use crate::api::params::TableSpec;
use crate::api::{Base, Enterprise, Table, Workspace};
use crate::config::ClientConfig;
use crate::error::{AirtableError, Result};
use crate::http::{HttpClient, ReqwestTransport, RetryStrategy, Transport};
use crate::models::schema::BasesPage;
use crate::models::{TableSchema, UserAndScopesInfo};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Default Airtable API endpoint
pub const DEFAULT_ENDPOINT_URL: &str = "https://api.airtable.com";

/// Default endpoint for attachment uploads
pub const DEFAULT_CONTENT_URL: &str = "https://content.airtable.com";

/// Maximum number of records per create/update/delete request
pub const MAX_RECORDS_PER_REQUEST: usize = 10;

/// Longest GET URL before list requests switch to POST
pub const MAX_URL_LENGTH: usize = 16_000;

/// Airtable API client
#[derive(Clone, Debug)]
pub struct Api {
    http: HttpClient,
    endpoint_url: Url,
    content_url: Url,
    use_field_ids: bool,
}

/// Builder for [`Api`]
pub struct ApiBuilder {
    api_key: Option<String>,
    endpoint_url: String,
    content_url: Option<String>,
    timeout: Option<Duration>,
    retry: RetryStrategy,
    use_field_ids: bool,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for ApiBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            content_url: None,
            timeout: None,
            retry: RetryStrategy::default(),
            use_field_ids: false,
            transport: None,
        }
    }
}

impl ApiBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the API endpoint (for proxies and tests)
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = endpoint_url.into();
        self
    }

    /// Set the attachment upload endpoint
    ///
    /// Defaults to the content API when using the default endpoint, and to
    /// the API endpoint otherwise.
    pub fn with_content_url(mut self, content_url: impl Into<String>) -> Self {
        self.content_url = Some(content_url.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the retry strategy
    pub fn with_retry_strategy(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Return fields keyed by field id by default
    pub fn with_use_field_ids(mut self, use_field_ids: bool) -> Self {
        self.use_field_ids = use_field_ids;
        self
    }

    /// Use a custom transport instead of the network
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<Api> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AirtableError::Config("an API key is required".to_string()))?;

        let endpoint_url = parse_url(&self.endpoint_url)?;
        let content_url = match self.content_url {
            Some(url) => parse_url(&url)?,
            None if self.endpoint_url.trim_end_matches('/') == DEFAULT_ENDPOINT_URL => {
                parse_url(DEFAULT_CONTENT_URL)?
            }
            None => endpoint_url.clone(),
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.timeout)?),
        };

        Ok(Api {
            http: HttpClient::new(transport, api_key).with_retry_strategy(self.retry),
            endpoint_url,
            content_url,
            use_field_ids: self.use_field_ids,
        })
    }
}

fn parse_url(url: &str) -> Result<Url> {
    let url = Url::parse(url)
        .map_err(|e| AirtableError::Config(format!("invalid endpoint URL {:?}: {}", url, e)))?;
    if url.cannot_be_a_base() {
        return Err(AirtableError::Config(format!(
            "endpoint URL {:?} cannot be a base",
            url.as_str()
        )));
    }
    Ok(url)
}

#[derive(Deserialize)]
struct CreateBaseResponse {
    id: String,
    #[serde(default)]
    tables: Vec<TableSchema>,
}

impl Api {
    /// Create a client with default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ApiBuilder::new().with_api_key(api_key).build()
    }

    /// Start building a customized client
    pub fn builder() -> ApiBuilder {
        ApiBuilder::new()
    }

    /// Create a client over a custom transport
    pub fn with_transport(api_key: impl Into<String>, transport: Arc<dyn Transport>) -> Result<Self> {
        ApiBuilder::new()
            .with_api_key(api_key)
            .with_transport(transport)
            .build()
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            AirtableError::Config(
                "no API key configured; set AIRTABLE_API_KEY or api_key in config.toml".to_string(),
            )
        })?;

        let mut builder = ApiBuilder::new()
            .with_api_key(api_key)
            .with_endpoint_url(config.endpoint_url.clone())
            .with_retry_strategy(config.retry.to_strategy())
            .with_use_field_ids(config.use_field_ids);
        if let Some(secs) = config.timeout_secs {
            builder = builder.with_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    /// The underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// The access token
    pub fn api_key(&self) -> &str {
        self.http.api_key()
    }

    /// Whether fields are keyed by id by default
    pub fn use_field_ids(&self) -> bool {
        self.use_field_ids
    }

    /// Build an API URL from path segments: `{endpoint}/v0/{segments...}`
    ///
    /// Segments are percent-encoded, so table names may contain spaces or
    /// slashes.
    pub fn build_url<I, S>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        join_segments(&self.endpoint_url, segments)
    }

    /// Build a URL on the attachment upload endpoint
    pub fn build_content_url<I, S>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        join_segments(&self.content_url, segments)
    }

    /// Send a request and decode the JSON response
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<T> {
        self.http.request_json(method, url, body).await
    }

    /// Iterate an offset-paginated endpoint
    pub fn iterate_requests<P>(&self, method: Method, url: Url, body: Option<Value>) -> Paginator<P>
    where
        P: crate::api::pagination::OffsetPage,
    {
        Paginator::new(self.clone(), method, url, body)
    }

    /// Information about the token owner
    pub async fn whoami(&self) -> Result<UserAndScopesInfo> {
        let url = self.build_url(["meta", "whoami"])?;
        self.request(Method::GET, url, None).await
    }

    /// All bases the token can access
    pub async fn bases(&self) -> Result<Vec<Base>> {
        let url = self.build_url(["meta", "bases"])?;
        let infos = self
            .iterate_requests::<BasesPage>(Method::GET, url, None)
            .collect_all()
            .await?;
        Ok(infos
            .into_iter()
            .map(|info| Base::from_info(self.clone(), info))
            .collect())
    }

    /// A base by id (no request is made)
    pub fn base(&self, base_id: impl Into<String>) -> Base {
        Base::new(self.clone(), base_id)
    }

    /// A table by base id and table id or name (no request is made)
    pub fn table(&self, base_id: impl Into<String>, table_id_or_name: impl Into<String>) -> Table {
        self.base(base_id).table(table_id_or_name)
    }

    /// A workspace by id (no request is made)
    pub fn workspace(&self, workspace_id: impl Into<String>) -> Workspace {
        Workspace::new(self.clone(), workspace_id)
    }

    /// An enterprise account by id (no request is made)
    pub fn enterprise(&self, enterprise_id: impl Into<String>) -> Enterprise {
        Enterprise::new(self.clone(), enterprise_id)
    }

    /// Create a base in a workspace
    ///
    /// At least one table is required by the API.
    pub async fn create_base(
        &self,
        workspace_id: &str,
        name: &str,
        tables: &[TableSpec],
    ) -> Result<Base> {
        if tables.is_empty() {
            return Err(AirtableError::InvalidParameter(
                "a new base needs at least one table".to_string(),
            ));
        }

        let url = self.build_url(["meta", "bases"])?;
        let body = json!({
            "name": name,
            "workspaceId": workspace_id,
            "tables": tables,
        });
        let response: CreateBaseResponse = self.request(Method::POST, url, Some(body)).await?;
        tracing::info!(base_id = %response.id, name, "created base");

        let base = self.base(response.id);
        base.set_cached_schema(response.tables).await;
        Ok(base)
    }
}

fn join_segments<I, S>(root: &Url, segments: I) -> Result<Url>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut url = root.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| AirtableError::Config(format!("cannot build URLs on {}", root)))?;
        path.pop_if_empty().push("v0");
        for segment in segments {
            path.push(segment.as_ref());
        }
    }
    Ok(url)
}
