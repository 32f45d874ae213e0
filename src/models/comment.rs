//! Record comments

use crate::models::Collaborator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user or group mentioned in a comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mentioned {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A comment on a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub last_updated_time: Option<DateTime<Utc>>,
    pub author: Collaborator,
    /// Mentions keyed by the token used in `text` (`@[usr...]`)
    #[serde(default)]
    pub mentioned: Option<BTreeMap<String, Mentioned>>,
}

/// One page of comments
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub offset: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comment_deserialization() {
        let comment: Comment = serde_json::from_value(json!({
            "id": "comAAAAAAAAAAAAAA",
            "text": "Hello @[usrAAAAAAAAAAAAAA]",
            "createdTime": "2023-05-22T21:24:15.000Z",
            "lastUpdatedTime": null,
            "author": {"id": "usrBBBBBBBBBBBBBB", "email": "bob@example.com"},
            "mentioned": {
                "usrAAAAAAAAAAAAAA": {
                    "id": "usrAAAAAAAAAAAAAA",
                    "type": "user",
                    "displayName": "Alice",
                    "email": "alice@example.com"
                }
            }
        }))
        .unwrap();

        assert_eq!(comment.author.email.as_deref(), Some("bob@example.com"));
        let mentioned = comment.mentioned.unwrap();
        assert_eq!(mentioned["usrAAAAAAAAAAAAAA"].kind, "user");
    }
}
