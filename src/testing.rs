//! Testing helpers
//!
//! Fake ids, records, users and attachments, and a [`MockTransport`] that
//! serves canned responses so code built on [`Api`] can be tested without
//! the network.

use crate::api::Api;
use crate::error::{AirtableError, Result};
use crate::http::{retry_strategy, ApiRequest, ApiResponse, Transport};
use crate::models::{AttachmentDict, Collaborator, Fields, RecordDict};
use crate::orm::ModelMeta;
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Access token used by the fake helpers
pub const FAKE_API_KEY: &str = "patFakeApiKey";

const ID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fake Airtable id: `prefix` followed by 14 characters
///
/// With a value, the value is left-padded with `0`
/// (`fake_id("rec", Some("123"))` is `rec00000000000123`); without one, a
/// fresh pseudo-random id is generated.
pub fn fake_id(prefix: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{}{:0>14}", prefix, value),
        None => {
            // splitmix64 over a process-wide counter; ids only need to be distinct, not random
            let mut x = ID_COUNTER
                .fetch_add(1, Ordering::Relaxed)
                .wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut suffix = String::with_capacity(14);
            for _ in 0..14 {
                x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
                x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
                x ^= x >> 31;
                suffix.push(ID_CHARS[(x % ID_CHARS.len() as u64) as usize] as char);
            }
            format!("{}{}", prefix, suffix)
        }
    }
}

/// A fake record with the given cell values
pub fn fake_record(fields: Fields, id: Option<&str>) -> RecordDict {
    RecordDict {
        id: fake_id("rec", id),
        created_time: Utc::now().trunc_subsecs(3),
        fields,
        comment_count: None,
    }
}

/// A fake collaborator
pub fn fake_user(value: Option<&str>) -> Collaborator {
    let id = fake_id("usr", value);
    Collaborator {
        email: Some(format!("{}@example.com", value.unwrap_or(&id))),
        name: Some("Fake User".to_string()),
        id,
    }
}

/// A fake attachment cell value
pub fn fake_attachment() -> AttachmentDict {
    let id = fake_id("att", None);
    AttachmentDict {
        url: format!("https://example.com/{}/foo.txt", id),
        id: Some(id),
        filename: Some("foo.txt".to_string()),
        size: Some(100),
        content_type: Some("text/plain".to_string()),
        ..AttachmentDict::default()
    }
}

/// Model metadata pointing at a fake base, using [`FAKE_API_KEY`]
pub fn fake_meta(base_id: Option<&str>, table_name: &str) -> ModelMeta {
    let base_id = base_id.map_or_else(|| fake_id("app", None), str::to_string);
    ModelMeta::new(base_id, table_name, FAKE_API_KEY)
}

/// Transport serving queued responses and recording every request
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockTransport {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response
    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.push_response(ApiResponse::new(status, body.to_string()))
    }

    /// Queue a 429 response carrying `Retry-After`
    pub fn push_rate_limited(&self, retry_after_secs: u64) -> &Self {
        let mut response = ApiResponse::new(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"errors":[{"error":{"code":"RATE_LIMIT_REACHED"}}]}"#,
        );
        response
            .headers
            .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        self.push_response(response)
    }

    /// Queue a raw response
    pub fn push_response(&self, response: ApiResponse) -> &Self {
        lock(&self.responses).push_back(Ok(response));
        self
    }

    /// Queue a failure returned in place of a response
    pub fn push_error(&self, error: AirtableError) -> &Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<ApiRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Number of queued responses not yet served
    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }

    /// Panic unless request `index` used `method` on a URL path ending in `path`
    pub fn assert_request(&self, index: usize, method: Method, path: &str) {
        let requests = lock(&self.requests);
        let request = requests
            .get(index)
            .unwrap_or_else(|| panic!("only {} requests were sent", requests.len()));
        assert_eq!(request.method, method, "method of request {}", index);
        assert!(
            request.url.path().ends_with(path),
            "request {} path {} does not end with {}",
            index,
            request.url.path(),
            path
        );
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = lock(&self.responses).pop_front();
        let description = format!("{} {}", request.method, request.url);
        lock(&self.requests).push(request);
        response.unwrap_or_else(|| {
            Err(AirtableError::NotFound(format!(
                "no mock response for {}",
                description
            )))
        })
    }
}

/// A real connection-refused error, for queueing with [`MockTransport::push_error`]
pub async fn connect_error() -> AirtableError {
    match reqwest::Client::new().get("http://127.0.0.1:1/").send().await {
        Err(e) => AirtableError::Http(e),
        Ok(response) => AirtableError::Config(format!(
            "expected a refused connection, got {}",
            response.status()
        )),
    }
}

/// A client wired to a fresh [`MockTransport`], retrying without delay
pub fn mock_api() -> Result<(Api, Arc<MockTransport>)> {
    let transport = Arc::new(MockTransport::new());
    let api = Api::builder()
        .with_api_key(FAKE_API_KEY)
        .with_transport(transport.clone())
        .with_retry_strategy(retry_strategy().with_backoff_factor(0.0))
        .build()?;
    Ok((api, transport))
}
