//! Model trait and record state

use super::fields::FieldDef;
use crate::api::{Api, RecordQuery, Table};
use crate::error::{AirtableError, Result};
use crate::formulas::{or, record_id};
use crate::models::{Comment, Fields, RecordDict, UpdateRecordDict};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;
use std::time::Duration;

/// Where a model's records live and how to reach them
#[derive(Debug)]
pub struct ModelMeta {
    pub base_id: String,
    pub table_name: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
    /// Let Airtable convert string values to the field's type
    pub typecast: bool,
    /// Field descriptors hold field ids rather than names
    pub use_field_ids: bool,
    api: OnceLock<Api>,
}

impl ModelMeta {
    /// Create metadata; `typecast` defaults to true
    pub fn new(
        base_id: impl Into<String>,
        table_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_id: base_id.into(),
            table_name: table_name.into(),
            api_key: api_key.into(),
            timeout: None,
            typecast: true,
            use_field_ids: false,
            api: OnceLock::new(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable typecasting on writes
    pub fn with_typecast(mut self, typecast: bool) -> Self {
        self.typecast = typecast;
        self
    }

    /// Key fields by id
    pub fn with_use_field_ids(mut self, use_field_ids: bool) -> Self {
        self.use_field_ids = use_field_ids;
        self
    }

    /// Use an existing client instead of building one from `api_key`
    pub fn with_api(self, api: Api) -> Self {
        let _ = self.api.set(api);
        self
    }

    /// The client, built on first use
    pub fn api(&self) -> Result<&Api> {
        if let Some(api) = self.api.get() {
            return Ok(api);
        }
        let mut builder = Api::builder()
            .with_api_key(self.api_key.clone())
            .with_use_field_ids(self.use_field_ids);
        if let Some(timeout) = self.timeout {
            builder = builder.with_timeout(timeout);
        }
        let api = builder.build()?;
        Ok(self.api.get_or_init(|| api))
    }

    /// The table holding this model's records
    pub fn table(&self) -> Result<Table> {
        Ok(self
            .api()?
            .table(self.base_id.clone(), self.table_name.clone()))
    }
}

/// Id, creation time and cell values of a model instance
///
/// Keeps a copy of the values last read from or written to Airtable so that
/// saves only send what changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordState {
    pub id: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub fields: Fields,
    synced: Fields,
}

impl RecordState {
    /// State of an unsaved record
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a record as returned by the API
    pub fn from_record(record: RecordDict) -> Self {
        let mut state = Self::new();
        state.sync(record);
        state
    }

    /// Whether the record exists in Airtable
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    /// Values as last synced with Airtable
    pub fn synced_fields(&self) -> &Fields {
        &self.synced
    }

    /// Whether a field differs from its synced value
    pub fn is_changed(&self, name: &str) -> bool {
        self.fields.get(name) != self.synced.get(name)
    }

    /// Names of fields that differ from their synced values
    pub fn changed_fields(&self) -> BTreeSet<String> {
        self.fields
            .keys()
            .chain(self.synced.keys())
            .filter(|name| self.is_changed(name))
            .cloned()
            .collect()
    }

    pub(crate) fn sync(&mut self, record: RecordDict) {
        self.id = Some(record.id);
        self.created_time = Some(record.created_time);
        self.synced = record.fields.clone();
        self.fields = record.fields;
    }
}

/// Outcome of [`Model::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResult {
    pub record_id: String,
    /// The record was created by this save
    pub created: bool,
    /// Fields sent to Airtable
    pub field_names: BTreeSet<String>,
    /// All fields were sent, changed or not
    pub forced: bool,
}

impl SaveResult {
    /// An existing record was updated
    pub fn updated(&self) -> bool {
        !self.created && !self.field_names.is_empty()
    }
}

/// A typed mapping between a struct and the records of a table
///
/// Implementors store a [`RecordState`] and declare their fields as
/// [`Field`](super::Field) constants; everything else is provided.
#[async_trait]
pub trait Model: Sized + Send + Sync + 'static {
    /// Table location and client settings
    fn meta() -> &'static ModelMeta;

    /// Declared fields
    fn field_defs() -> Vec<FieldDef>;

    fn record(&self) -> &RecordState;

    fn record_mut(&mut self) -> &mut RecordState;

    /// Wrap a record state
    fn from_state(state: RecordState) -> Self;

    /// The table holding this model's records
    fn table() -> Result<Table> {
        Self::meta().table()
    }

    /// Record id, once saved
    fn id(&self) -> Option<&str> {
        self.record().id.as_deref()
    }

    /// Whether the instance has been saved
    fn exists(&self) -> bool {
        self.record().is_saved()
    }

    /// An unsaved instance holding these cell values
    fn from_fields(fields: Fields) -> Self {
        Self::from_state(RecordState {
            fields,
            ..RecordState::new()
        })
    }

    /// An instance of a record returned by the API
    fn from_record(record: RecordDict) -> Self {
        Self::from_state(RecordState::from_record(record))
    }

    /// The record as the API would return it
    fn to_record(&self) -> Result<RecordDict> {
        let state = self.record();
        match (&state.id, state.created_time) {
            (Some(id), Some(created_time)) => Ok(RecordDict {
                id: id.clone(),
                created_time,
                fields: state.fields.clone(),
                comment_count: None,
            }),
            _ => Err(AirtableError::UnsavedRecord),
        }
    }

    /// Writable declared fields that have a value
    fn to_fields(&self) -> Fields {
        let fields = &self.record().fields;
        writable_names::<Self>()
            .filter_map(|name| fields.get(name).map(|v| (name.to_string(), v.clone())))
            .collect()
    }

    /// Writable declared fields that changed since the last sync
    ///
    /// Emptied fields are sent as `null`.
    fn changed_fields(&self) -> Fields {
        let state = self.record();
        writable_names::<Self>()
            .filter(|name| state.is_changed(name))
            .map(|name| {
                let value = state.fields.get(name).cloned().unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect()
    }

    /// Create or update the record
    ///
    /// Unsaved instances are created with every writable field. Saved ones
    /// send only changed fields, or every writable field when `force` is set.
    async fn save(&mut self, force: bool) -> Result<SaveResult> {
        let meta = Self::meta();
        let table = meta.table()?;

        let Some(record_id) = self.id().map(str::to_string) else {
            let fields = self.to_fields();
            let field_names = fields.keys().cloned().collect();
            let record = table.create(fields, meta.typecast).await?;
            let record_id = record.id.clone();
            self.record_mut().sync(record);
            tracing::debug!(table = %meta.table_name, %record_id, "created model record");
            return Ok(SaveResult {
                record_id,
                created: true,
                field_names,
                forced: false,
            });
        };

        let fields = if force {
            let current = &self.record().fields;
            writable_names::<Self>()
                .map(|name| {
                    let value = current.get(name).cloned().unwrap_or(Value::Null);
                    (name.to_string(), value)
                })
                .collect()
        } else {
            self.changed_fields()
        };
        let field_names: BTreeSet<String> = fields.keys().cloned().collect();

        if field_names.is_empty() && !force {
            return Ok(SaveResult {
                record_id,
                created: false,
                field_names,
                forced: false,
            });
        }

        let record = table
            .update(&record_id, fields, false, meta.typecast)
            .await?;
        self.record_mut().sync(record);
        Ok(SaveResult {
            record_id,
            created: false,
            field_names,
            forced: force,
        })
    }

    /// Delete the record; returns whether Airtable reported it deleted
    async fn delete(&self) -> Result<bool> {
        let record_id = self.id().ok_or(AirtableError::UnsavedRecord)?;
        let deleted = Self::table()?.delete(record_id).await?;
        Ok(deleted.deleted)
    }

    /// Reload every field from Airtable, discarding local changes
    async fn fetch(&mut self) -> Result<()> {
        let record_id = self
            .id()
            .ok_or(AirtableError::UnsavedRecord)?
            .to_string();
        let record = Self::table()?
            .get(&record_id, &RecordQuery::new())
            .await?;
        self.record_mut().sync(record);
        Ok(())
    }

    /// Load one record by id
    async fn from_id(record_id: &str) -> Result<Self> {
        let mut model = Self::from_state(RecordState {
            id: Some(record_id.to_string()),
            ..RecordState::new()
        });
        model.fetch().await?;
        Ok(model)
    }

    /// Load several records by id, in the order given
    ///
    /// Fails with [`AirtableError::NotFound`] if any id is missing.
    async fn from_ids(record_ids: &[&str]) -> Result<Vec<Self>> {
        if record_ids.is_empty() {
            return Ok(Vec::new());
        }
        let formula = or(record_ids.iter().map(|id| record_id().equals(*id)))?;
        let records = Self::table()?
            .all(&RecordQuery::new().with_formula(formula))
            .await?;

        let mut by_id: HashMap<String, RecordDict> =
            records.into_iter().map(|r| (r.id.clone(), r)).collect();
        record_ids
            .iter()
            .map(|id| {
                by_id
                    .remove(*id)
                    .map(Self::from_record)
                    .ok_or_else(|| AirtableError::NotFound(format!("record {}", id)))
            })
            .collect()
    }

    /// All records matching a query
    async fn all(query: &RecordQuery) -> Result<Vec<Self>> {
        let records = Self::table()?.all(query).await?;
        Ok(records.into_iter().map(Self::from_record).collect())
    }

    /// The first record matching a query
    async fn first(query: &RecordQuery) -> Result<Option<Self>> {
        let record = Self::table()?.first(query).await?;
        Ok(record.map(Self::from_record))
    }

    /// Save many instances with batch requests
    ///
    /// Unsaved instances are created; saved ones send their changed fields.
    /// Instances without changes are skipped.
    async fn batch_save(models: &mut [Self]) -> Result<()> {
        let meta = Self::meta();
        let table = meta.table()?;

        let (new, existing): (Vec<usize>, Vec<usize>) =
            (0..models.len()).partition(|&i| !models[i].exists());

        let creates: Vec<Fields> = new.iter().map(|&i| models[i].to_fields()).collect();
        let created = table.batch_create(&creates, meta.typecast).await?;
        for (&i, record) in new.iter().zip(created) {
            models[i].record_mut().sync(record);
        }

        let mut updated_idx = Vec::new();
        let mut updates = Vec::new();
        for &i in &existing {
            let fields = models[i].changed_fields();
            if fields.is_empty() {
                continue;
            }
            if let Some(id) = models[i].id() {
                updates.push(UpdateRecordDict {
                    id: id.to_string(),
                    fields,
                });
                updated_idx.push(i);
            }
        }
        let updated = table.batch_update(&updates, false, meta.typecast).await?;
        for (&i, record) in updated_idx.iter().zip(updated) {
            models[i].record_mut().sync(record);
        }

        tracing::debug!(
            table = %meta.table_name,
            created = new.len(),
            updated = updated_idx.len(),
            "batch saved models"
        );
        Ok(())
    }

    /// Delete many saved instances with batch requests
    async fn batch_delete(models: &[Self]) -> Result<()> {
        let ids = models
            .iter()
            .map(|m| m.id().ok_or(AirtableError::UnsavedRecord))
            .collect::<Result<Vec<_>>>()?;
        Self::table()?.batch_delete(&ids).await?;
        Ok(())
    }

    /// Comments on the record
    async fn comments(&self) -> Result<Vec<Comment>> {
        let record_id = self.id().ok_or(AirtableError::UnsavedRecord)?;
        Self::table()?.comments(record_id).await
    }

    /// Add a comment to the record
    async fn add_comment(&self, text: &str) -> Result<Comment> {
        let record_id = self.id().ok_or(AirtableError::UnsavedRecord)?;
        Self::table()?.add_comment(record_id, text).await
    }
}

fn writable_names<M: Model>() -> impl Iterator<Item = &'static str> {
    M::field_defs()
        .into_iter()
        .filter(|def| !def.read_only)
        .map(|def| def.name)
}
