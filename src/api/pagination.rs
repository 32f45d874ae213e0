//! Offset pagination
//!
//! Most list endpoints return one page plus an opaque `offset`; passing the
//! offset back returns the next page. [`Paginator`] follows offsets until the
//! API stops returning one.

use crate::api::Api;
use crate::error::Result;
use crate::models::comment::CommentPage;
use crate::models::schema::BasesPage;
use crate::models::{BaseInfo, Comment, RecordDict};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// A response page carrying an offset to the next page
pub trait OffsetPage: DeserializeOwned {
    /// Item type of the page
    type Item;

    /// Split the page into its items and the next offset
    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

/// Page of records
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub records: Vec<RecordDict>,
    #[serde(default)]
    pub offset: Option<String>,
}

impl OffsetPage for RecordPage {
    type Item = RecordDict;

    fn into_parts(self) -> (Vec<RecordDict>, Option<String>) {
        (self.records, self.offset)
    }
}

impl OffsetPage for BasesPage {
    type Item = BaseInfo;

    fn into_parts(self) -> (Vec<BaseInfo>, Option<String>) {
        (self.bases, self.offset)
    }
}

impl OffsetPage for CommentPage {
    type Item = Comment;

    fn into_parts(self) -> (Vec<Comment>, Option<String>) {
        (self.comments, self.offset)
    }
}

/// Cursor over an offset-paginated endpoint
///
/// GET requests pass the offset as a query parameter; POST requests put it
/// in the JSON body.
pub struct Paginator<P> {
    api: Api,
    method: Method,
    url: Url,
    body: Option<Value>,
    offset: Option<String>,
    done: bool,
    _page: PhantomData<fn() -> P>,
}

impl<P: OffsetPage> Paginator<P> {
    /// Create a paginator starting at the first page
    pub fn new(api: Api, method: Method, url: Url, body: Option<Value>) -> Self {
        Self {
            api,
            method,
            url,
            body,
            offset: None,
            done: false,
            _page: PhantomData,
        }
    }

    /// Whether every page has been fetched
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetch the next page, or `None` once exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<P::Item>>> {
        if self.done {
            return Ok(None);
        }

        let mut url = self.url.clone();
        let mut body = self.body.clone();
        if let Some(offset) = &self.offset {
            if self.method == Method::GET {
                url.query_pairs_mut().append_pair("offset", offset);
            } else {
                let map = body.get_or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(map) = map {
                    map.insert("offset".to_string(), Value::String(offset.clone()));
                }
            }
        }

        let page: P = self.api.request(self.method.clone(), url, body).await?;
        let (items, offset) = page.into_parts();
        tracing::debug!(items = items.len(), more = offset.is_some(), "fetched page");

        self.done = offset.is_none();
        self.offset = offset;
        Ok(Some(items))
    }

    /// Fetch all remaining pages
    pub async fn collect_all(mut self) -> Result<Vec<P::Item>> {
        let mut all = Vec::new();
        while let Some(items) = self.next_page().await? {
            all.extend(items);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock_api;
    use serde_json::json;

    fn record(id: &str) -> Value {
        json!({"id": id, "createdTime": "2024-01-01T00:00:00.000Z", "fields": {}})
    }

    #[tokio::test]
    async fn test_post_offset_without_body() {
        let (api, mock) = mock_api().unwrap();
        mock.push_json(200, json!({"records": [record("rec1")], "offset": "itr2"}))
            .push_json(200, json!({"records": [record("rec2")]}));

        let url = api.build_url(["appA", "Contacts", "listRecords"]).unwrap();
        let records = api
            .iterate_requests::<RecordPage>(Method::POST, url, None)
            .collect_all()
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        let requests = mock.requests();
        assert!(requests[0].body.is_none());
        assert_eq!(requests[1].body, Some(json!({"offset": "itr2"})));
    }

    #[tokio::test]
    async fn test_get_offset_in_query() {
        let (api, mock) = mock_api().unwrap();
        mock.push_json(200, json!({"records": [record("rec1")], "offset": "itr2"}))
            .push_json(200, json!({"records": []}));

        let url = api.build_url(["appA", "Contacts"]).unwrap();
        let mut pages = api.iterate_requests::<RecordPage>(Method::GET, url, None);
        assert_eq!(pages.next_page().await.unwrap().unwrap().len(), 1);
        assert!(!pages.is_done());
        assert!(pages.next_page().await.unwrap().unwrap().is_empty());
        assert!(pages.is_done());
        assert!(pages.next_page().await.unwrap().is_none());

        assert_eq!(mock.requests()[1].url.query(), Some("offset=itr2"));
        assert!(mock.requests()[1].body.is_none());
    }
}
