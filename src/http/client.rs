//! Airtable HTTP client
//!
//! This module provides the authenticated client used by every API object,
//! with retry logic, exponential backoff, and Airtable error decoding.

use crate::error::{AirtableError, Result};
use crate::http::retry::RetryStrategy;
use crate::http::transport::{ApiRequest, ApiResponse, Transport};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Sent with every request
pub const USER_AGENT: &str = concat!("airtable-kit/", env!("CARGO_PKG_VERSION"));

/// HTTP client for Airtable API requests
#[derive(Clone)]
pub struct HttpClient {
    /// Transport that performs the actual I/O
    transport: Arc<dyn Transport>,
    /// Personal access token
    api_key: String,
    /// Retry policy
    retry: RetryStrategy,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("api_key", &"<redacted>")
            .field("retry", &self.retry)
            .finish()
    }
}

impl HttpClient {
    /// Create a new client over the given transport
    pub fn new(transport: Arc<dyn Transport>, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            retry: RetryStrategy::default(),
        }
    }

    /// Set the retry strategy
    pub fn with_retry_strategy(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the retry strategy
    pub fn retry_strategy(&self) -> &RetryStrategy {
        &self.retry
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Send a request with retry logic
    ///
    /// Returns the successful response; non-2xx statuses that are not retried
    /// become [`AirtableError::Api`].
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        let mut headers = Self::build_headers(&self.api_key)?;
        headers.extend(request.headers.drain());
        request.headers = headers;

        let mut attempt = 0;
        loop {
            tracing::debug!(method = %request.method, url = %request.url, attempt, "sending request");

            let response = match self.transport.send(request.clone()).await {
                Ok(response) => response,
                Err(e) if e.is_transient_transport()
                    && self.retry.should_retry_transport(&request.method, attempt) =>
                {
                    let delay = self.retry.backoff(attempt, None);
                    tracing::warn!(error = %e, ?delay, attempt, "transport error, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let status = response.status;
            if status.is_success() {
                return Ok(response);
            }

            // Check if we should retry
            if self.retry.should_retry(&request.method, status, attempt) {
                let delay = self.retry.backoff(attempt, response.retry_after());
                tracing::warn!(%status, ?delay, attempt, url = %request.url, "retrying request");
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(Self::error_from_response(status, &response.body));
        }
    }

    /// Send a request and decode the JSON response body
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<T> {
        let mut request = ApiRequest::new(method, url);
        request.body = body;
        let response = self.send(request).await?;
        Self::decode(&response.body)
    }

    /// Decode a response body, treating an empty body as `null`
    pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
        if body.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_str(body)?)
    }

    /// Convert an error response into an [`AirtableError`]
    ///
    /// Airtable returns either `{"error": {"type": ..., "message": ...}}`
    /// or `{"error": "TYPE"}`.
    pub fn error_from_response(status: StatusCode, body: &str) -> AirtableError {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ErrorBody {
            Detailed { r#type: String, message: Option<String> },
            Code(String),
        }

        #[derive(Deserialize)]
        struct Envelope {
            error: ErrorBody,
        }

        let (error_type, message) = match serde_json::from_str::<Envelope>(body) {
            Ok(Envelope {
                error: ErrorBody::Detailed { r#type, message },
            }) => (r#type, message.unwrap_or_default()),
            Ok(Envelope {
                error: ErrorBody::Code(code),
            }) => (code, String::new()),
            Err(_) => (
                status
                    .canonical_reason()
                    .unwrap_or("UNKNOWN_ERROR")
                    .to_string(),
                body.to_string(),
            ),
        };

        AirtableError::Api {
            status: status.as_u16(),
            error_type,
            message,
        }
    }

    /// Build standard headers for API requests
    pub fn build_headers(api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| AirtableError::InvalidHeader("API key contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        Self::add_header(headers, "user-agent", USER_AGENT)
    }

    /// Add custom header to existing headers
    pub fn add_header(mut headers: HeaderMap, key: &str, value: &str) -> Result<HeaderMap> {
        let key_header = HeaderName::from_str(key).map_err(|_| {
            AirtableError::InvalidHeader(format!("Invalid header name: {}", key))
        })?;
        let value_header = HeaderValue::from_str(value).map_err(|_| {
            AirtableError::InvalidHeader(format!("Invalid header value for {}", key))
        })?;

        headers.insert(key_header, value_header);
        Ok(headers)
    }
}
