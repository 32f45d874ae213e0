//! Table
//!
//! Record reads and writes, comments, field definitions and attachment
//! uploads for one table.

use crate::api::client::{MAX_RECORDS_PER_REQUEST, MAX_URL_LENGTH};
use crate::api::pagination::{Paginator, RecordPage};
use crate::api::params::{FieldSpec, RecordQuery};
use crate::api::{Api, Base};
use crate::error::{AirtableError, Result};
use crate::models::comment::CommentPage;
use crate::models::{
    Comment, FieldSchema, Fields, RecordDeletedDict, RecordDict, TableSchema, UpdateRecordDict,
    UploadAttachmentResult, UpsertResultDict,
};
use crate::utils::{chunked, is_table_id};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Query parameters accepted when fetching a single record
const GET_RECORD_PARAMS: &[&str] = &[
    "cellFormat",
    "userLocale",
    "timeZone",
    "returnFieldsByFieldId",
];

#[derive(Deserialize)]
struct RecordList {
    #[serde(default)]
    records: Vec<RecordDict>,
}

#[derive(Deserialize)]
struct DeletedList {
    #[serde(default)]
    records: Vec<RecordDeletedDict>,
}

/// A table, addressed by id or name within a [`Base`]
#[derive(Clone, Debug)]
pub struct Table {
    base: Base,
    id_or_name: String,
}

impl Table {
    pub(crate) fn new(base: Base, id_or_name: impl Into<String>) -> Self {
        Self {
            base,
            id_or_name: id_or_name.into(),
        }
    }

    /// Table id or name, as given
    pub fn id_or_name(&self) -> &str {
        &self.id_or_name
    }

    /// The base this table belongs to
    pub fn base(&self) -> &Base {
        &self.base
    }

    /// The client this table is bound to
    pub fn api(&self) -> &Api {
        self.base.api()
    }

    /// Records URL: `/v0/{base_id}/{table}`
    pub fn url(&self) -> Result<Url> {
        self.api()
            .build_url([self.base.id(), self.id_or_name.as_str()])
    }

    /// URL of one record
    pub fn record_url(&self, record_id: &str) -> Result<Url> {
        self.api()
            .build_url([self.base.id(), self.id_or_name.as_str(), record_id])
    }

    fn record_sub_url(&self, record_id: &str, segments: &[&str]) -> Result<Url> {
        let mut path = vec![self.base.id(), self.id_or_name.as_str(), record_id];
        path.extend_from_slice(segments);
        self.api().build_url(path)
    }

    /// Schema of this table, looked up in the base schema by id or name
    ///
    /// A table missing from the cached schema triggers one refresh before
    /// giving up.
    pub async fn schema(&self) -> Result<TableSchema> {
        if let Some(table) = self.base.schema().await?.table(&self.id_or_name) {
            return Ok(table.clone());
        }
        self.base
            .schema_refresh()
            .await?
            .table(&self.id_or_name)
            .cloned()
            .ok_or_else(|| AirtableError::NotFound(format!("table {}", self.id_or_name)))
    }

    /// Table id, resolving a name through the schema when needed
    pub async fn table_id(&self) -> Result<String> {
        if is_table_id(&self.id_or_name) {
            return Ok(self.id_or_name.clone());
        }
        Ok(self.schema().await?.id)
    }

    fn with_field_ids(&self, query: &RecordQuery) -> RecordQuery {
        let mut query = query.clone();
        if query.return_fields_by_field_id.is_none() && self.api().use_field_ids() {
            query.return_fields_by_field_id = Some(true);
        }
        query
    }

    fn write_body(&self, mut body: Map<String, Value>, typecast: bool) -> Value {
        body.insert("typecast".into(), json!(typecast));
        if self.api().use_field_ids() {
            body.insert("returnFieldsByFieldId".into(), json!(true));
        }
        Value::Object(body)
    }

    /// Fetch one record
    pub async fn get(&self, record_id: &str, query: &RecordQuery) -> Result<RecordDict> {
        let mut url = self.record_url(record_id)?;
        let pairs: Vec<_> = self
            .with_field_ids(query)
            .to_query_pairs()
            .into_iter()
            .filter(|(key, _)| GET_RECORD_PARAMS.contains(&key.as_str()))
            .collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        self.api().request(Method::GET, url, None).await
    }

    /// Iterate records page by page
    ///
    /// Uses `GET` with query parameters unless the URL would be longer than
    /// [`MAX_URL_LENGTH`], in which case the same options are sent to
    /// `POST .../listRecords`.
    pub fn iterate(&self, query: &RecordQuery) -> Result<RecordPages> {
        let query = self.with_field_ids(query);

        let mut url = self.url()?;
        let pairs = query.to_query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let pages = if url.as_str().len() > MAX_URL_LENGTH {
            tracing::debug!(
                table = %self.id_or_name,
                url_length = url.as_str().len(),
                "switching to POST listRecords"
            );
            let url = self.record_sub_url("listRecords", &[])?;
            Paginator::new(self.api().clone(), Method::POST, url, Some(query.to_json()))
        } else {
            Paginator::new(self.api().clone(), Method::GET, url, None)
        };

        Ok(RecordPages {
            pages,
            remaining: query.max_records.map(|n| n as usize),
        })
    }

    /// Fetch every record matching the query
    pub async fn all(&self, query: &RecordQuery) -> Result<Vec<RecordDict>> {
        self.iterate(query)?.collect_all().await
    }

    /// Fetch the first record matching the query
    pub async fn first(&self, query: &RecordQuery) -> Result<Option<RecordDict>> {
        let query = query.clone().with_page_size(1).with_max_records(1);
        Ok(self.all(&query).await?.into_iter().next())
    }

    /// Create one record
    pub async fn create(&self, fields: Fields, typecast: bool) -> Result<RecordDict> {
        let mut body = Map::new();
        body.insert("fields".into(), Value::Object(fields));
        let body = self.write_body(body, typecast);
        self.api()
            .request(Method::POST, self.url()?, Some(body))
            .await
    }

    /// Create many records, [`MAX_RECORDS_PER_REQUEST`] per request
    ///
    /// Created records are returned in input order.
    pub async fn batch_create(&self, records: &[Fields], typecast: bool) -> Result<Vec<RecordDict>> {
        let url = self.url()?;
        let mut created = Vec::with_capacity(records.len());
        for chunk in chunked(records, MAX_RECORDS_PER_REQUEST) {
            let mut body = Map::new();
            body.insert(
                "records".into(),
                chunk.iter().map(|fields| json!({ "fields": fields })).collect(),
            );
            let body = self.write_body(body, typecast);
            let page: RecordList = self
                .api()
                .request(Method::POST, url.clone(), Some(body))
                .await?;
            created.extend(page.records);
        }
        tracing::debug!(table = %self.id_or_name, count = created.len(), "created records");
        Ok(created)
    }

    /// Update one record
    ///
    /// `replace` sends a `PUT`, clearing every field not given.
    pub async fn update(
        &self,
        record_id: &str,
        fields: Fields,
        replace: bool,
        typecast: bool,
    ) -> Result<RecordDict> {
        let mut body = Map::new();
        body.insert("fields".into(), Value::Object(fields));
        let body = self.write_body(body, typecast);
        self.api()
            .request(update_method(replace), self.record_url(record_id)?, Some(body))
            .await
    }

    /// Update many records, [`MAX_RECORDS_PER_REQUEST`] per request
    pub async fn batch_update(
        &self,
        records: &[UpdateRecordDict],
        replace: bool,
        typecast: bool,
    ) -> Result<Vec<RecordDict>> {
        let url = self.url()?;
        let mut updated = Vec::with_capacity(records.len());
        for chunk in chunked(records, MAX_RECORDS_PER_REQUEST) {
            let mut body = Map::new();
            body.insert("records".into(), serde_json::to_value(chunk)?);
            let body = self.write_body(body, typecast);
            let page: RecordList = self
                .api()
                .request(update_method(replace), url.clone(), Some(body))
                .await?;
            updated.extend(page.records);
        }
        Ok(updated)
    }

    /// Create or update records matched on `key_fields`
    ///
    /// Every record must carry a value for each key field. Results of all
    /// chunks are merged into one [`UpsertResultDict`].
    pub async fn batch_upsert(
        &self,
        records: &[Fields],
        key_fields: &[&str],
        replace: bool,
        typecast: bool,
    ) -> Result<UpsertResultDict> {
        validate_upsert(records, key_fields)?;

        let url = self.url()?;
        let mut result = UpsertResultDict::default();
        for chunk in chunked(records, MAX_RECORDS_PER_REQUEST) {
            let mut body = Map::new();
            body.insert(
                "records".into(),
                chunk.iter().map(|fields| json!({ "fields": fields })).collect(),
            );
            body.insert(
                "performUpsert".into(),
                json!({ "fieldsToMergeOn": key_fields }),
            );
            let body = self.write_body(body, typecast);
            let page: UpsertResultDict = self
                .api()
                .request(update_method(replace), url.clone(), Some(body))
                .await?;
            result.created_records.extend(page.created_records);
            result.updated_records.extend(page.updated_records);
            result.records.extend(page.records);
        }
        tracing::debug!(
            table = %self.id_or_name,
            created = result.created_records.len(),
            updated = result.updated_records.len(),
            "upserted records"
        );
        Ok(result)
    }

    /// Delete one record
    pub async fn delete(&self, record_id: &str) -> Result<RecordDeletedDict> {
        self.api()
            .request(Method::DELETE, self.record_url(record_id)?, None)
            .await
    }

    /// Delete many records, [`MAX_RECORDS_PER_REQUEST`] per request
    pub async fn batch_delete<S: AsRef<str>>(
        &self,
        record_ids: &[S],
    ) -> Result<Vec<RecordDeletedDict>> {
        let mut deleted = Vec::with_capacity(record_ids.len());
        for chunk in chunked(record_ids, MAX_RECORDS_PER_REQUEST) {
            let mut url = self.url()?;
            url.query_pairs_mut()
                .extend_pairs(chunk.iter().map(|id| ("records[]", id.as_ref())));
            let page: DeletedList = self.api().request(Method::DELETE, url, None).await?;
            deleted.extend(page.records);
        }
        Ok(deleted)
    }

    /// All comments on a record, newest first
    pub async fn comments(&self, record_id: &str) -> Result<Vec<Comment>> {
        let url = self.record_sub_url(record_id, &["comments"])?;
        self.api()
            .iterate_requests::<CommentPage>(Method::GET, url, None)
            .collect_all()
            .await
    }

    /// Add a comment to a record
    ///
    /// Mention users with `@[usrXXXXXXXXXXXXXX]` in the text.
    pub async fn add_comment(&self, record_id: &str, text: &str) -> Result<Comment> {
        let url = self.record_sub_url(record_id, &["comments"])?;
        self.api()
            .request(Method::POST, url, Some(json!({ "text": text })))
            .await
    }

    /// Change the text of a comment
    pub async fn update_comment(
        &self,
        record_id: &str,
        comment_id: &str,
        text: &str,
    ) -> Result<Comment> {
        let url = self.record_sub_url(record_id, &["comments", comment_id])?;
        self.api()
            .request(Method::PATCH, url, Some(json!({ "text": text })))
            .await
    }

    /// Delete a comment
    pub async fn delete_comment(&self, record_id: &str, comment_id: &str) -> Result<()> {
        let url = self.record_sub_url(record_id, &["comments", comment_id])?;
        let _: Value = self.api().request(Method::DELETE, url, None).await?;
        Ok(())
    }

    /// Add a field to the table
    pub async fn create_field(&self, spec: &FieldSpec) -> Result<FieldSchema> {
        let table_id = self.table_id().await?;
        let url = self.base.meta_url(["tables", table_id.as_str(), "fields"])?;
        let body = serde_json::to_value(spec)?;
        let field: FieldSchema = self.api().request(Method::POST, url, Some(body)).await?;
        tracing::info!(table_id = %table_id, field_id = %field.id, "created field");

        self.base.invalidate_schema().await;
        Ok(field)
    }

    /// Rename a field or change its description
    pub async fn update_field(
        &self,
        field_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<FieldSchema> {
        let mut body = Map::new();
        if let Some(name) = name {
            body.insert("name".into(), json!(name));
        }
        if let Some(description) = description {
            body.insert("description".into(), json!(description));
        }
        if body.is_empty() {
            return Err(AirtableError::InvalidParameter(
                "update_field needs a name or a description".to_string(),
            ));
        }

        let table_id = self.table_id().await?;
        let url = self
            .base
            .meta_url(["tables", table_id.as_str(), "fields", field_id])?;
        let field = self
            .api()
            .request(Method::PATCH, url, Some(Value::Object(body)))
            .await?;
        self.base.invalidate_schema().await;
        Ok(field)
    }

    /// Upload a file straight into an attachment field
    ///
    /// The file is sent base64-encoded to the content endpoint and appended
    /// to the field's existing attachments.
    pub async fn upload_attachment(
        &self,
        record_id: &str,
        field: &str,
        filename: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<UploadAttachmentResult> {
        let url = self.api().build_content_url([
            self.base.id(),
            record_id,
            field,
            "uploadAttachment",
        ])?;
        let body = json!({
            "contentType": content_type,
            "file": BASE64.encode(content),
            "filename": filename,
        });
        tracing::debug!(record_id, field, bytes = content.len(), "uploading attachment");
        self.api().request(Method::POST, url, Some(body)).await
    }
}

fn update_method(replace: bool) -> Method {
    if replace {
        Method::PUT
    } else {
        Method::PATCH
    }
}

fn validate_upsert(records: &[Fields], key_fields: &[&str]) -> Result<()> {
    if key_fields.is_empty() {
        return Err(AirtableError::InvalidParameter(
            "batch_upsert needs at least one key field".to_string(),
        ));
    }
    for (i, fields) in records.iter().enumerate() {
        if let Some(missing) = key_fields.iter().find(|key| !fields.contains_key(**key)) {
            return Err(AirtableError::InvalidParameter(format!(
                "record {} is missing key field {:?}",
                i, missing
            )));
        }
    }
    Ok(())
}

/// Cursor over the records of a table
///
/// Stops early once `max_records` records have been returned.
pub struct RecordPages {
    pages: Paginator<RecordPage>,
    remaining: Option<usize>,
}

impl RecordPages {
    /// Fetch the next page, or `None` once exhausted
    pub async fn next_page(&mut self) -> Result<Option<Vec<RecordDict>>> {
        if self.remaining == Some(0) {
            return Ok(None);
        }
        let Some(mut records) = self.pages.next_page().await? else {
            return Ok(None);
        };
        if let Some(remaining) = self.remaining.as_mut() {
            records.truncate(*remaining);
            *remaining -= records.len();
        }
        Ok(Some(records))
    }

    /// Fetch every remaining record
    pub async fn collect_all(mut self) -> Result<Vec<RecordDict>> {
        let mut all = Vec::new();
        while let Some(records) = self.next_page().await? {
            all.extend(records);
        }
        Ok(all)
    }
}
