//! Enterprise account
//!
//! Enterprise metadata, users, groups, admin grants and the audit log. These
//! endpoints require an enterprise admin token.

use crate::api::Api;
use crate::error::{AirtableError, Result};
use crate::models::schema::UsersPage;
use crate::models::{AuditLogEvent, AuditLogResponse, EnterpriseInfo, UserGroup, UserInfo};
use chrono::{DateTime, Utc};
use reqwest::{Method, Url};
use serde_json::{json, Map, Value};

/// An enterprise account, bound to an [`Api`]
#[derive(Clone, Debug)]
pub struct Enterprise {
    api: Api,
    id: String,
}

/// Filters for the audit log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditLogQuery {
    pub page_size: Option<u32>,
    /// Oldest first when true
    pub ascending: bool,
    pub originating_user_id: Option<String>,
    pub event_type: Option<String>,
    pub model_id: Option<String>,
    pub category: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Stop after this many events
    pub max_events: Option<usize>,
}

impl AuditLogQuery {
    /// Create an unfiltered query
    pub fn new() -> Self {
        Self::default()
    }

    fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![(
            "sortOrder",
            if self.ascending { "ascending" } else { "descending" }.to_string(),
        )];
        if let Some(size) = self.page_size {
            pairs.push(("pageSize", size.to_string()));
        }
        if let Some(user) = &self.originating_user_id {
            pairs.push(("originatingUserId", user.clone()));
        }
        if let Some(event_type) = &self.event_type {
            pairs.push(("eventType", event_type.clone()));
        }
        if let Some(model_id) = &self.model_id {
            pairs.push(("modelId", model_id.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(start) = &self.start_time {
            pairs.push(("startTime", crate::utils::datetime_to_iso_str(start)));
        }
        if let Some(end) = &self.end_time {
            pairs.push(("endTime", crate::utils::datetime_to_iso_str(end)));
        }
        pairs
    }
}

impl Enterprise {
    pub(crate) fn new(api: Api, id: impl Into<String>) -> Self {
        Self { api, id: id.into() }
    }

    /// Enterprise account id (`ent...`)
    pub fn id(&self) -> &str {
        &self.id
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut path = vec!["meta", "enterpriseAccounts", self.id.as_str()];
        path.extend_from_slice(segments);
        self.api.build_url(path)
    }

    /// Enterprise account metadata
    pub async fn info(&self) -> Result<EnterpriseInfo> {
        self.api.request(Method::GET, self.url(&[])?, None).await
    }

    /// One user by id
    pub async fn user(&self, user_id: &str) -> Result<UserInfo> {
        let url = self.url(&["users", user_id])?;
        self.api.request(Method::GET, url, None).await
    }

    /// Several users by id
    pub async fn users<S: AsRef<str>>(&self, user_ids: &[S]) -> Result<Vec<UserInfo>> {
        self.users_by("id", user_ids).await
    }

    /// Several users by email address
    pub async fn users_by_email<S: AsRef<str>>(&self, emails: &[S]) -> Result<Vec<UserInfo>> {
        self.users_by("email", emails).await
    }

    async fn users_by<S: AsRef<str>>(&self, key: &str, values: &[S]) -> Result<Vec<UserInfo>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let mut url = self.url(&["users"])?;
        url.query_pairs_mut()
            .extend_pairs(values.iter().map(|v| (key, v.as_ref())));
        let page: UsersPage = self.api.request(Method::GET, url, None).await?;
        Ok(page.users)
    }

    /// A user group by id
    pub async fn group(&self, group_id: &str) -> Result<UserGroup> {
        let url = self.api.build_url(["meta", "groups", group_id])?;
        self.api.request(Method::GET, url, None).await
    }

    /// Iterate audit log events
    pub fn audit_log(&self, query: AuditLogQuery) -> Result<AuditLogCursor> {
        let mut url = self.url(&["auditLogEvents"])?;
        url.query_pairs_mut().extend_pairs(query.to_query_pairs());
        Ok(AuditLogCursor {
            api: self.api.clone(),
            url,
            next: None,
            remaining: query.max_events,
            done: false,
        })
    }

    /// Remove a user from the enterprise
    ///
    /// Bases and workspaces the user solely owns are handed to
    /// `replacement_owner_id`.
    pub async fn remove_user(
        &self,
        user_id: &str,
        replacement_owner_id: Option<&str>,
    ) -> Result<Value> {
        let url = self.url(&["users", user_id, "remove"])?;
        let mut body = Map::new();
        if let Some(replacement) = replacement_owner_id {
            body.insert("replacementOwnerId".into(), json!(replacement));
        }
        let result = self
            .api
            .request(Method::POST, url, Some(Value::Object(body)))
            .await?;
        tracing::info!(enterprise_id = %self.id, user_id, "removed user");
        Ok(result)
    }

    /// Grant admin access to users
    pub async fn grant_admin<S: AsRef<str>>(&self, user_ids: &[S]) -> Result<Value> {
        self.admin_access("grantAdminAccess", user_ids).await
    }

    /// Revoke admin access from users
    pub async fn revoke_admin<S: AsRef<str>>(&self, user_ids: &[S]) -> Result<Value> {
        self.admin_access("revokeAdminAccess", user_ids).await
    }

    async fn admin_access<S: AsRef<str>>(&self, action: &str, user_ids: &[S]) -> Result<Value> {
        if user_ids.is_empty() {
            return Err(AirtableError::InvalidParameter(format!(
                "{} needs at least one user",
                action
            )));
        }
        let users: Vec<Value> = user_ids
            .iter()
            .map(|id| json!({ "id": id.as_ref() }))
            .collect();
        let url = self.url(&[action])?;
        self.api
            .request(Method::POST, url, Some(json!({ "users": users })))
            .await
    }
}

/// Cursor over audit log events, following `pagination.next`
pub struct AuditLogCursor {
    api: Api,
    url: Url,
    next: Option<String>,
    remaining: Option<usize>,
    done: bool,
}

impl AuditLogCursor {
    /// Fetch the next page of events, or `None` once exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<AuditLogEvent>>> {
        if self.done || self.remaining == Some(0) {
            return Ok(None);
        }

        let mut url = self.url.clone();
        if let Some(next) = &self.next {
            url.query_pairs_mut().append_pair("next", next);
        }
        let page: AuditLogResponse = self.api.request(Method::GET, url, None).await?;

        let mut events = page.events;
        if let Some(remaining) = self.remaining.as_mut() {
            events.truncate(*remaining);
            *remaining -= events.len();
        }
        self.next = page.pagination.and_then(|p| p.next);
        self.done = self.next.is_none() || events.is_empty();
        Ok(Some(events))
    }

    /// Fetch every remaining event
    pub async fn collect_all(mut self) -> Result<Vec<AuditLogEvent>> {
        let mut all = Vec::new();
        while let Some(events) = self.next_page().await? {
            all.extend(events);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_audit_log_query_pairs() {
        let query = AuditLogQuery {
            page_size: Some(50),
            event_type: Some("createBase".to_string()),
            start_time: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            ..AuditLogQuery::new()
        };
        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("sortOrder", "descending".to_string())));
        assert!(pairs.contains(&("pageSize", "50".to_string())));
        assert!(pairs.contains(&("eventType", "createBase".to_string())));
        assert!(pairs.contains(&("startTime", "2024-01-02T03:04:05.000Z".to_string())));
    }

    #[test]
    fn test_enterprise_urls() {
        let api = Api::new("patTest").unwrap();
        let enterprise = api.enterprise("entAAAAAAAAAAAAAA");
        assert_eq!(
            enterprise.url(&["users", "usrB"]).unwrap().as_str(),
            "https://api.airtable.com/v0/meta/enterpriseAccounts/entAAAAAAAAAAAAAA/users/usrB"
        );
    }
}
