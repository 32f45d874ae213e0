//! Workspace

use crate::api::params::TableSpec;
use crate::api::{Api, Base};
use crate::error::Result;
use crate::models::WorkspaceInfo;
use reqwest::Method;
use serde_json::{json, Map, Value};

/// A workspace, bound to an [`Api`]
#[derive(Clone, Debug)]
pub struct Workspace {
    api: Api,
    id: String,
}

impl Workspace {
    pub(crate) fn new(api: Api, id: impl Into<String>) -> Self {
        Self { api, id: id.into() }
    }

    /// Workspace id (`wsp...`)
    pub fn id(&self) -> &str {
        &self.id
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut path = vec!["meta", "workspaces", self.id.as_str()];
        path.extend_from_slice(segments);
        self.api.build_url(path)
    }

    /// Workspace metadata with collaborators
    pub async fn info(&self) -> Result<WorkspaceInfo> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("include", "collaborators")
            .append_pair("include", "inviteLinks");
        self.api.request(Method::GET, url, None).await
    }

    /// Bases in the workspace
    pub async fn bases(&self) -> Result<Vec<Base>> {
        let info = self.info().await?;
        Ok(info
            .base_ids
            .into_iter()
            .map(|id| self.api.base(id))
            .collect())
    }

    /// Create a base in this workspace
    pub async fn create_base(&self, name: &str, tables: &[TableSpec]) -> Result<Base> {
        self.api.create_base(&self.id, name, tables).await
    }

    /// Delete the workspace
    pub async fn delete(&self) -> Result<()> {
        let _: Value = self.api.request(Method::DELETE, self.url(&[])?, None).await?;
        tracing::info!(workspace_id = %self.id, "deleted workspace");
        Ok(())
    }

    /// Move a base into another workspace
    ///
    /// `target_index` places the base at a position in the target's base
    /// order; `None` appends it.
    pub async fn move_base(
        &self,
        base_id: &str,
        target_workspace_id: &str,
        target_index: Option<u32>,
    ) -> Result<()> {
        let mut body = Map::new();
        body.insert("baseId".into(), json!(base_id));
        body.insert("targetWorkspaceId".into(), json!(target_workspace_id));
        if let Some(index) = target_index {
            body.insert("targetIndex".into(), json!(index));
        }
        let url = self.url(&["moveBase"])?;
        let _: Value = self
            .api
            .request(Method::POST, url, Some(Value::Object(body)))
            .await?;
        tracing::info!(base_id, from = %self.id, to = target_workspace_id, "moved base");
        Ok(())
    }
}
